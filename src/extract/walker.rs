// src/extract/walker.rs
//! The recursive extraction walk.
//!
//! A depth-first traversal over an explicit LIFO stack of [`WalkStep`]s.
//! Each popped step expands one node through the level expander, reports
//! the counts to the job tracker immediately, and pushes steps for every
//! child that can itself have children. The parent's record is always
//! durably stored before its children are requested, so a reader
//! mid-walk never sees an orphan.

use super::context::WalkContext;
use super::expander::LevelExpander;
use super::jobs::{Counters, ExtractionJob, JobTracker};
use super::steps::{SkipReason, WalkStep};
use crate::error::{AlmErrorCode, AppError};
use crate::model::EntityKind;
use crate::types::{EntityId, JobId, Username};
use std::sync::Arc;

/// Runs full-subtree extractions tracked as jobs.
#[derive(Clone)]
pub struct RecursiveExtractor {
    expander: LevelExpander,
    jobs: Arc<JobTracker>,
    owner: Username,
}

impl RecursiveExtractor {
    pub fn new(expander: LevelExpander, jobs: Arc<JobTracker>) -> Self {
        let owner = expander.owner().clone();
        Self {
            expander,
            jobs,
            owner,
        }
    }

    /// Extracts the full subtree under the root and returns the final job
    /// document.
    ///
    /// A fatal walk error is recorded on the job (status `failed`, error
    /// detail, counters preserved) and still yields the job document; an
    /// `Err` here means the job infrastructure itself is broken.
    pub async fn extract_recursive(
        &self,
        root_kind: EntityKind,
        root_id: &EntityId,
    ) -> Result<ExtractionJob, AppError> {
        let job_id = self.begin(root_kind, root_id).await?;
        self.walk_and_finalize(&job_id, root_kind, root_id.clone())
            .await?;
        self.jobs.get_job(&self.owner, &job_id).await
    }

    /// Starts the walk on a background task and returns the job id
    /// immediately; progress is observed by polling the job tracker.
    pub async fn spawn_recursive(
        &self,
        root_kind: EntityKind,
        root_id: &EntityId,
    ) -> Result<JobId, AppError> {
        let job_id = self.begin(root_kind, root_id).await?;
        let walker = self.clone();
        let spawned_job = job_id.clone();
        let root_id = root_id.clone();
        tokio::spawn(async move {
            if let Err(e) = walker
                .walk_and_finalize(&spawned_job, root_kind, root_id)
                .await
            {
                log::error!("Job {} could not be finalized: {}", spawned_job, e);
            }
        });
        Ok(job_id)
    }

    async fn begin(&self, root_kind: EntityKind, root_id: &EntityId) -> Result<JobId, AppError> {
        if !root_kind.is_walk_root() {
            return Err(AppError::Validation(format!(
                "recursive extraction cannot start at a {} node",
                root_kind
            )));
        }
        let job_id = self.jobs.create_job(&self.owner, root_id, root_kind).await?;
        self.jobs.start_job(&self.owner, &job_id).await?;
        Ok(job_id)
    }

    async fn walk_and_finalize(
        &self,
        job_id: &JobId,
        root_kind: EntityKind,
        root_id: EntityId,
    ) -> Result<(), AppError> {
        match self.walk(job_id, root_kind, &root_id).await {
            Ok(()) => self.jobs.complete_job(&self.owner, job_id).await,
            Err(e) => self.jobs.fail_job(&self.owner, job_id, &e).await,
        }
    }

    async fn walk(
        &self,
        job_id: &JobId,
        root_kind: EntityKind,
        root_id: &EntityId,
    ) -> Result<(), AppError> {
        // The root's own record lands first; children always find their
        // parent already present.
        let raw_root = self
            .expander
            .fetch_entity(root_kind, root_id)
            .await?
            .ok_or_else(|| AppError::AlmService {
                code: AlmErrorCode::NotFound,
                message: format!("{} {} not found upstream", root_kind, root_id),
            })?;
        self.expander
            .store_one(root_kind, None, None, &raw_root)
            .await?;
        let mut root_delta = Counters::default();
        root_delta.record(root_kind, 1);
        self.jobs
            .update_counters(&self.owner, job_id, &root_delta)
            .await?;

        let mut stack = vec![WalkStep::new(
            root_kind,
            root_id.clone(),
            WalkContext::root(),
        )];

        while let Some(WalkStep { kind, id, context }) = stack.pop() {
            if context.already_visited(kind, &id) {
                let skip = SkipReason::AlreadyVisited(kind, id);
                self.jobs
                    .add_note(&self.owner, job_id, skip.to_string())
                    .await?;
                continue;
            }
            if context.depth_exhausted() {
                let skip = SkipReason::DepthExhausted(kind, id);
                self.jobs
                    .add_note(&self.owner, job_id, skip.to_string())
                    .await?;
                continue;
            }
            let context = context.visit(kind, id.clone());

            log::debug!(
                "Expanding {} {} (depth remaining {})",
                kind,
                id,
                context.depth_remaining
            );

            for &child_kind in kind.child_kinds() {
                let level = self.expander.expand_child_kind(kind, &id, child_kind).await?;
                // Counters move immediately, not batched at the end, so a
                // job inspected mid-flight shows true partial progress.
                self.jobs
                    .update_counters(&self.owner, job_id, &level.counters)
                    .await?;

                if child_kind.child_kinds().is_empty() {
                    continue;
                }
                for child in level.records.iter().rev() {
                    stack.push(WalkStep::new(
                        child_kind,
                        child.id.clone(),
                        context.descend(),
                    ));
                }
            }
        }

        Ok(())
    }
}
