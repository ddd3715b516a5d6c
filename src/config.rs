// src/config.rs
use crate::error::AppError;
use crate::model::EntityKind;
use crate::types::{Credentials, EntityId, Scope, Username};
use clap::Parser;
use std::path::PathBuf;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Id of the root entity to extract (e.g. a test-plan folder id)
    pub root_id: String,

    /// Kind of the root entity: folder, release, or defect
    #[arg(short = 'k', long, default_value = "folder")]
    pub kind: String,

    /// Base URL of the ALM server (defaults to the ALM_BASE_URL env var)
    #[arg(long)]
    pub base_url: Option<String>,

    /// ALM domain of the project being extracted
    #[arg(short, long)]
    pub domain: String,

    /// ALM project being extracted
    #[arg(short, long)]
    pub project: String,

    /// Upstream username (the password is read from ALM_PASSWORD)
    #[arg(short, long)]
    pub user: String,

    /// Expand only the immediate children instead of walking recursively
    #[arg(long, default_value_t = false)]
    pub one_level: bool,

    /// Directory to export the extracted collections into, one JSON file
    /// per collection
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved extraction configuration — validated and ready to drive a run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub scope: Scope,
    pub credentials: Credentials,
    pub owner: Username,
    pub root_id: EntityId,
    pub root_kind: EntityKind,
    pub one_level: bool,
    pub output_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl ExtractionConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let base_url = cli
            .base_url
            .or_else(|| std::env::var("ALM_BASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                AppError::MissingConfiguration(
                    "no base URL: pass --base-url or set ALM_BASE_URL".to_string(),
                )
            })?;

        let password = std::env::var("ALM_PASSWORD").map_err(|_| {
            AppError::MissingConfiguration(
                "ALM_PASSWORD environment variable not set".to_string(),
            )
        })?;

        let root_kind = EntityKind::from_tag(&cli.kind)
            .filter(EntityKind::is_walk_root)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "'{}' is not an extractable root kind (folder, release, defect)",
                    cli.kind
                ))
            })?;

        let owner = Username::new(cli.user)?;
        Ok(Self {
            base_url,
            scope: Scope::new(cli.domain, cli.project)?,
            credentials: Credentials::new(owner.clone(), password),
            owner,
            root_id: EntityId::new(cli.root_id)?,
            root_kind,
            one_level: cli.one_level,
            output_dir: cli.output_dir.map(PathBuf::from),
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_root_kinds_are_rejected() {
        assert!(EntityKind::from_tag("test")
            .filter(EntityKind::is_walk_root)
            .is_none());
        assert!(EntityKind::from_tag("folder")
            .filter(EntityKind::is_walk_root)
            .is_some());
        assert!(EntityKind::from_tag("release")
            .filter(EntityKind::is_walk_root)
            .is_some());
    }
}
