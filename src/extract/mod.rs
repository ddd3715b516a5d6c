// src/extract/mod.rs
//! The extraction engine: level expansion, recursive walks, attachment
//! materialization, job tracking, and tree reassembly.
//!
//! [`Extractor`] is the front door a collaborator (a UI handler, the CLI)
//! talks to. It never hands out raw upstream payloads: everything flows
//! through normalization and storage, and callers re-query what they need.

mod attachments;
mod context;
mod expander;
mod jobs;
mod steps;
mod tree;
mod walker;

pub use attachments::{sanitize_filename, AttachmentMaterializer};
pub use context::WalkContext;
pub use expander::LevelExpander;
pub use jobs::{Counters, ExtractionJob, JobStatus, JobTracker};
pub use steps::{SkipReason, WalkStep};
pub use tree::{assemble_tree, ExtractedNode};
pub use walker::RecursiveExtractor;

use crate::api::{AlmApi, SessionHandle};
use crate::error::AppError;
use crate::model::{EntityKind, EntityRecord};
use crate::store::DocumentStore;
use crate::types::{EntityId, JobId, Scope, Username};
use std::sync::Arc;

/// The operations the engine exposes to collaborators.
pub struct Extractor {
    expander: LevelExpander,
    walker: RecursiveExtractor,
    jobs: Arc<JobTracker>,
    store: Arc<dyn DocumentStore>,
    owner: Username,
}

impl Extractor {
    pub fn new(
        api: Arc<dyn AlmApi>,
        store: Arc<dyn DocumentStore>,
        session: Arc<SessionHandle>,
        scope: Scope,
        owner: Username,
    ) -> Self {
        let expander = LevelExpander::new(
            api,
            Arc::clone(&store),
            session,
            scope,
            owner.clone(),
        );
        let jobs = Arc::new(JobTracker::new(Arc::clone(&store)));
        let walker = RecursiveExtractor::new(expander.clone(), Arc::clone(&jobs));
        Self {
            expander,
            walker,
            jobs,
            store,
            owner,
        }
    }

    /// Fetches and stores the immediate children of one node, returning
    /// only per-kind counts.
    pub async fn expand_one_level(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Counters, AppError> {
        self.expander.expand_one_level(kind, id).await
    }

    /// Extracts a full subtree, blocking until the walk finishes, and
    /// returns the final job document.
    pub async fn extract_recursive(
        &self,
        root_kind: EntityKind,
        root_id: &EntityId,
    ) -> Result<ExtractionJob, AppError> {
        self.walker.extract_recursive(root_kind, root_id).await
    }

    /// Starts a full-subtree extraction in the background; poll the job
    /// for progress.
    pub async fn spawn_recursive(
        &self,
        root_kind: EntityKind,
        root_id: &EntityId,
    ) -> Result<JobId, AppError> {
        self.walker.spawn_recursive(root_kind, root_id).await
    }

    /// Reads one extraction job.
    pub async fn get_job(&self, job_id: &JobId) -> Result<ExtractionJob, AppError> {
        self.jobs.get_job(&self.owner, job_id).await
    }

    /// Rebuilds the nested tree of an already-extracted subtree from
    /// storage.
    pub async fn assemble_tree(
        &self,
        root_kind: EntityKind,
        root_id: &EntityId,
    ) -> Result<ExtractedNode, AppError> {
        assemble_tree(self.store.as_ref(), &self.owner, root_kind, root_id).await
    }

    /// Mirrors the upstream domain list into storage.
    pub async fn discover_domains(&self) -> Result<Vec<EntityRecord>, AppError> {
        self.expander.discover_domains().await
    }

    /// Mirrors a domain's project list into storage.
    pub async fn discover_projects(&self, domain: &str) -> Result<Vec<EntityRecord>, AppError> {
        self.expander.discover_projects(domain).await
    }
}
