// src/main.rs

use alm2store::{
    AlmHttpClient, AppError, Collection, CommandLineInput, ExtractionConfig, ExtractionJob,
    Extractor, JobStatus, MemoryStore, SessionHandle,
};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("alm2store.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Authenticate → extract → export → report.
async fn run_extraction(config: &ExtractionConfig) -> Result<(), AppError> {
    let client = Arc::new(AlmHttpClient::new(&config.base_url)?);
    let session = Arc::new(
        SessionHandle::sign_in(client.clone(), config.credentials.clone()).await?,
    );
    let store = Arc::new(MemoryStore::new());

    let extractor = Extractor::new(
        client,
        store.clone(),
        Arc::clone(&session),
        config.scope.clone(),
        config.owner.clone(),
    );

    if config.one_level {
        let counts = extractor
            .expand_one_level(config.root_kind, &config.root_id)
            .await?;
        println!(
            "Expanded {} {} one level: {:?}",
            config.root_kind, config.root_id, counts
        );
    } else {
        let job = extractor
            .extract_recursive(config.root_kind, &config.root_id)
            .await?;
        report_job(&job);
        if job.status == JobStatus::Failed {
            export_collections(&store, config)?;
            let _ = session.logout().await;
            return Err(AppError::InternalError {
                message: job
                    .error
                    .unwrap_or_else(|| "extraction failed".to_string()),
                source: None,
            });
        }
    }

    export_collections(&store, config)?;
    session.logout().await?;
    Ok(())
}

/// Prints the final job summary.
fn report_job(job: &ExtractionJob) {
    println!(
        "Job {} {} ({} {})",
        job.job_id, job.status.as_str(), job.root_entity_kind, job.root_entity_id
    );
    let c = &job.counters;
    println!(
        "  folders: {}, tests: {}, design steps: {}, releases: {}, cycles: {}, \
         test sets: {}, runs: {}, defects: {}",
        c.folders, c.tests, c.design_steps, c.releases, c.cycles, c.test_sets, c.runs, c.defects
    );
    println!(
        "  attachments: {} discovered, {} downloaded",
        c.attachments, c.attachments_downloaded
    );
    for note in &job.notes {
        println!("  note: {}", note);
    }
    if let Some(error) = &job.error {
        eprintln!("  error: {}", error);
    }
}

/// Writes every non-empty collection to `<output_dir>/<collection>.json`.
fn export_collections(store: &MemoryStore, config: &ExtractionConfig) -> Result<(), AppError> {
    let Some(output_dir) = &config.output_dir else {
        return Ok(());
    };
    fs::create_dir_all(output_dir)?;

    let mut exported = 0usize;
    for collection in Collection::ALL {
        let documents = store.dump(collection);
        if documents.is_empty() {
            continue;
        }
        let path = output_dir.join(format!("{}.json", collection));
        fs::write(&path, serde_json::to_string_pretty(&documents)?)?;
        log::info!("Exported {} documents to {}", documents.len(), path.display());
        exported += 1;
    }
    if exported > 0 {
        println!("Exported {} collections to {}", exported, output_dir.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = ExtractionConfig::resolve(cli)?;

    run_extraction(&config).await?;

    Ok(())
}
