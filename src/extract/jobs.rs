// src/extract/jobs.rs
//! Persistent tracking of long-running extraction jobs.
//!
//! A job document is created when a recursive extraction starts and is
//! the only mutable record in the model: counters grow while the walk
//! runs, the status moves through its lifecycle, and the final state
//! stays queryable for pollers long after the walk's caller is gone.

use crate::catalog::Collection;
use crate::error::AppError;
use crate::model::EntityKind;
use crate::store::{record_key, DocumentStore, Filter};
use crate::types::{EntityId, JobId, Username};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Running totals of extracted entities, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub folders: u64,
    pub tests: u64,
    pub design_steps: u64,
    pub releases: u64,
    pub cycles: u64,
    pub test_sets: u64,
    pub runs: u64,
    pub defects: u64,
    /// Attachment metadata records discovered and stored.
    pub attachments: u64,
    /// Attachment binaries actually cached; lags `attachments` when
    /// individual downloads fail.
    pub attachments_downloaded: u64,
}

impl Counters {
    /// Adds another set of counters into this one.
    pub fn add(&mut self, delta: &Counters) {
        self.folders += delta.folders;
        self.tests += delta.tests;
        self.design_steps += delta.design_steps;
        self.releases += delta.releases;
        self.cycles += delta.cycles;
        self.test_sets += delta.test_sets;
        self.runs += delta.runs;
        self.defects += delta.defects;
        self.attachments += delta.attachments;
        self.attachments_downloaded += delta.attachments_downloaded;
    }

    /// Records `n` extracted entities of the given kind. Attachment
    /// downloads are tracked separately via the dedicated field.
    pub fn record(&mut self, kind: EntityKind, n: u64) {
        match kind {
            EntityKind::Folder => self.folders += n,
            EntityKind::Test => self.tests += n,
            EntityKind::DesignStep => self.design_steps += n,
            EntityKind::Release => self.releases += n,
            EntityKind::Cycle => self.cycles += n,
            EntityKind::TestSet => self.test_sets += n,
            EntityKind::Run => self.runs += n,
            EntityKind::Defect => self.defects += n,
            EntityKind::Attachment => self.attachments += n,
            EntityKind::Domain | EntityKind::Project => {}
        }
    }

    /// Count of stored entities for one kind.
    pub fn for_kind(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Folder => self.folders,
            EntityKind::Test => self.tests,
            EntityKind::DesignStep => self.design_steps,
            EntityKind::Release => self.releases,
            EntityKind::Cycle => self.cycles,
            EntityKind::TestSet => self.test_sets,
            EntityKind::Run => self.runs,
            EntityKind::Defect => self.defects,
            EntityKind::Attachment => self.attachments,
            EntityKind::Domain | EntityKind::Project => 0,
        }
    }
}

/// Lifecycle state of an extraction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// The persisted job document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub user: Username,
    pub job_id: JobId,
    pub root_entity_id: EntityId,
    /// Storage tag of the root kind (`folder`, `release`, `defect`).
    pub root_entity_kind: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub counters: Counters,
    /// Boundary conditions met during the walk (depth ceiling, skipped
    /// revisits). These do not fail the job.
    pub notes: Vec<String>,
    pub error: Option<String>,
}

/// Creates, mutates, and reads job documents.
///
/// All counter updates are additive increments applied under a tracker
/// mutex: the storage capability only offers whole-document upsert, so
/// the read-add-write cycle is serialized here to keep increments safe
/// if sibling subtrees are ever walked concurrently.
pub struct JobTracker {
    store: Arc<dyn DocumentStore>,
    update_lock: Mutex<()>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            update_lock: Mutex::new(()),
        }
    }

    /// Creates a pending job document and returns its id.
    pub async fn create_job(
        &self,
        owner: &Username,
        root_id: &EntityId,
        root_kind: EntityKind,
    ) -> Result<JobId, AppError> {
        let job = ExtractionJob {
            user: owner.clone(),
            job_id: JobId::generate(),
            root_entity_id: root_id.clone(),
            root_entity_kind: root_kind.storage_tag().to_string(),
            status: JobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            counters: Counters::default(),
            notes: Vec::new(),
            error: None,
        };
        let job_id = job.job_id.clone();
        self.write(&job).await?;
        log::info!(
            "Created extraction job {} for {} {} (user {})",
            job_id,
            root_kind,
            root_id,
            owner
        );
        Ok(job_id)
    }

    /// Fetches a job by id.
    pub async fn get_job(&self, owner: &Username, job_id: &JobId) -> Result<ExtractionJob, AppError> {
        let filter = Filter::new()
            .owned_by(owner)
            .field("job_id", job_id.to_string());
        let docs = self.store.find(Collection::ExtractionJobs, &filter).await?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Marks the job as running.
    pub async fn start_job(&self, owner: &Username, job_id: &JobId) -> Result<(), AppError> {
        self.mutate(owner, job_id, |job| {
            job.status = JobStatus::InProgress;
        })
        .await
    }

    /// Adds a delta to the job's counters. Increments only, never a full
    /// overwrite, so no progress is lost between concurrent updates.
    pub async fn update_counters(
        &self,
        owner: &Username,
        job_id: &JobId,
        delta: &Counters,
    ) -> Result<(), AppError> {
        self.mutate(owner, job_id, |job| {
            job.counters.add(delta);
        })
        .await
    }

    /// Records a boundary condition without failing the job.
    pub async fn add_note(
        &self,
        owner: &Username,
        job_id: &JobId,
        note: impl Into<String>,
    ) -> Result<(), AppError> {
        let note = note.into();
        log::warn!("Job {}: {}", job_id, note);
        self.mutate(owner, job_id, |job| {
            job.notes.push(note.clone());
        })
        .await
    }

    /// Finalizes a successful walk.
    pub async fn complete_job(&self, owner: &Username, job_id: &JobId) -> Result<(), AppError> {
        self.mutate(owner, job_id, |job| {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Finalizes a fatally failed walk. Counters accumulated so far stay
    /// in place; extraction is explicitly not transactional.
    pub async fn fail_job(
        &self,
        owner: &Username,
        job_id: &JobId,
        error: &AppError,
    ) -> Result<(), AppError> {
        let message = error.to_string();
        log::error!("Job {} failed: {}", job_id, message);
        self.mutate(owner, job_id, |job| {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
            job.error = Some(message.clone());
        })
        .await
    }

    async fn mutate(
        &self,
        owner: &Username,
        job_id: &JobId,
        apply: impl Fn(&mut ExtractionJob),
    ) -> Result<(), AppError> {
        let _guard = self.update_lock.lock().await;
        let mut job = self.get_job(owner, job_id).await?;
        apply(&mut job);
        self.write(&job).await
    }

    async fn write(&self, job: &ExtractionJob) -> Result<(), AppError> {
        let key = record_key(&job.user, &job.job_id.to_string());
        self.store
            .upsert(Collection::ExtractionJobs, &key, serde_json::to_value(job)?)
            .await
    }
}
