// src/extract/expander.rs
//! One-level expansion of a tree node.
//!
//! For a given parent entity, fetches exactly the child kinds relevant to
//! its kind, normalizes every record, and upserts it through the
//! collection router. The public contract returns only aggregate counts:
//! callers that need the children re-query storage, which keeps the
//! "expand a node" operation cheap and level-bounded.

use super::attachments::AttachmentMaterializer;
use super::jobs::Counters;
use crate::api::{fetch_all_pages, AlmApi, ListFilter, SessionHandle};
use crate::catalog::Collection;
use crate::error::AppError;
use crate::error_recovery::{retry_standard, with_session_renewal};
use crate::model::{EntityKind, EntityRecord, RawEntity};
use crate::normalize::{normalize, normalize_flat};
use crate::store::{record_key, DocumentStore};
use crate::types::{EntityId, Scope, Username};
use std::sync::Arc;

/// Result of expanding one child kind under one parent.
pub(crate) struct ExpandedLevel {
    pub records: Vec<EntityRecord>,
    pub counters: Counters,
}

/// Fetch-normalize-store engine for one level of the tree.
#[derive(Clone)]
pub struct LevelExpander {
    api: Arc<dyn AlmApi>,
    store: Arc<dyn DocumentStore>,
    session: Arc<SessionHandle>,
    scope: Scope,
    owner: Username,
    materializer: AttachmentMaterializer,
}

impl LevelExpander {
    pub fn new(
        api: Arc<dyn AlmApi>,
        store: Arc<dyn DocumentStore>,
        session: Arc<SessionHandle>,
        scope: Scope,
        owner: Username,
    ) -> Self {
        let materializer = AttachmentMaterializer::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&session),
            scope.clone(),
            owner.clone(),
        );
        Self {
            api,
            store,
            session,
            scope,
            owner,
            materializer,
        }
    }

    pub fn owner(&self) -> &Username {
        &self.owner
    }

    /// Expands one level under the given entity and returns the per-kind
    /// counts. Idempotent over storage: a second call re-fetches upstream
    /// but leaves the same stored state behind.
    pub async fn expand_one_level(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Counters, AppError> {
        if matches!(kind, EntityKind::Domain | EntityKind::Project) {
            return Err(AppError::Validation(format!(
                "{} nodes are expanded through scope discovery, not level expansion",
                kind
            )));
        }

        let mut counters = Counters::default();
        for child_kind in kind.child_kinds() {
            let level = self.expand_child_kind(kind, id, *child_kind).await?;
            counters.add(&level.counters);
        }
        log::debug!("Expanded {} {}: {:?}", kind, id, counters);
        Ok(counters)
    }

    /// Fetches, normalizes, and stores all children of one kind under one
    /// parent. Attachment children are additionally materialized into the
    /// binary cache.
    pub(crate) async fn expand_child_kind(
        &self,
        parent_kind: EntityKind,
        parent_id: &EntityId,
        child_kind: EntityKind,
    ) -> Result<ExpandedLevel, AppError> {
        let mut counters = Counters::default();

        if child_kind == EntityKind::Attachment {
            let filter = ListFilter::AttachmentsOf {
                parent_id: parent_id.clone(),
                parent_kind,
            };
            let raws = self.fetch_pages(EntityKind::Attachment, &filter).await?;
            let records = self
                .store_records(EntityKind::Attachment, Some(parent_kind), Some(parent_id), &raws)
                .await?;

            counters.attachments = records.len() as u64;
            for record in &records {
                if self.materializer.materialize(record).await {
                    counters.attachments_downloaded += 1;
                }
            }
            return Ok(ExpandedLevel { records, counters });
        }

        let filter = ListFilter::ByParent(parent_id.clone());
        let raws = self.fetch_pages(child_kind, &filter).await?;
        let records = self
            .store_records(child_kind, None, Some(parent_id), &raws)
            .await?;
        counters.record(child_kind, records.len() as u64);
        Ok(ExpandedLevel { records, counters })
    }

    /// Fetches one entity by id. `None` when the upstream has no match.
    pub(crate) async fn fetch_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Option<RawEntity>, AppError> {
        let raws = self
            .fetch_pages(kind, &ListFilter::ById(id.clone()))
            .await?;
        Ok(raws.into_iter().next())
    }

    /// Normalizes and upserts one raw entity, returning the stored record.
    pub(crate) async fn store_one(
        &self,
        kind: EntityKind,
        parent_kind: Option<EntityKind>,
        parent_id: Option<&EntityId>,
        raw: &RawEntity,
    ) -> Result<EntityRecord, AppError> {
        let records = self
            .store_records(kind, parent_kind, parent_id, std::slice::from_ref(raw))
            .await?;
        records.into_iter().next().ok_or_else(|| AppError::InternalError {
            message: "storing one record yielded none".to_string(),
            source: None,
        })
    }

    /// Lists the upstream domains and mirrors them into storage.
    pub async fn discover_domains(&self) -> Result<Vec<EntityRecord>, AppError> {
        self.discover_flat(EntityKind::Domain, None).await
    }

    /// Lists the projects of a domain and mirrors them into storage.
    pub async fn discover_projects(&self, domain: &str) -> Result<Vec<EntityRecord>, AppError> {
        let parent = EntityId::new(domain)?;
        self.discover_flat(EntityKind::Project, Some(parent)).await
    }

    async fn discover_flat(
        &self,
        kind: EntityKind,
        parent: Option<EntityId>,
    ) -> Result<Vec<EntityRecord>, AppError> {
        let domain = parent.as_ref().map(|p| p.as_str().to_string());
        let raws = retry_standard(|| {
            with_session_renewal(self.session.as_ref(), |token| {
                let api = Arc::clone(&self.api);
                let domain = domain.clone();
                async move { api.list_flat(&token, kind, domain.as_deref()).await }
            })
        })
        .await?;

        let collection = Collection::resolve(kind, None)?;
        let mut records = Vec::with_capacity(raws.len());
        for raw in &raws {
            let record = normalize_flat(kind, raw, &self.owner, parent.as_ref())?;
            self.store
                .upsert(
                    collection,
                    &record_key(&self.owner, record.id.as_str()),
                    record.to_document(),
                )
                .await?;
            records.push(record);
        }
        log::info!("Discovered {} {}(s)", records.len(), kind);
        Ok(records)
    }

    /// Runs the paginated fetch for one kind/filter with the standard
    /// retry and session-renewal policy applied per page.
    async fn fetch_pages(
        &self,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> Result<Vec<RawEntity>, AppError> {
        fetch_all_pages(|start_index, page_size| {
            let filter = filter.clone();
            async move {
                retry_standard(|| {
                    with_session_renewal(self.session.as_ref(), |token| {
                        let api = Arc::clone(&self.api);
                        let scope = self.scope.clone();
                        let filter = filter.clone();
                        async move {
                            api.list_page(&token, &scope, kind, &filter, start_index, page_size)
                                .await
                        }
                    })
                })
                .await
            }
        })
        .await
    }

    async fn store_records(
        &self,
        kind: EntityKind,
        parent_kind: Option<EntityKind>,
        parent_id: Option<&EntityId>,
        raws: &[RawEntity],
    ) -> Result<Vec<EntityRecord>, AppError> {
        let collection = Collection::resolve(kind, parent_kind)?;
        let mut records = Vec::with_capacity(raws.len());
        for raw in raws {
            let record = normalize(kind, parent_kind, raw, &self.owner, parent_id)?;
            self.store
                .upsert(
                    collection,
                    &record_key(&self.owner, record.id.as_str()),
                    record.to_document(),
                )
                .await
                .map_err(|e| AppError::Storage {
                    collection: collection.as_str().to_string(),
                    cause: e.to_string(),
                })?;
            records.push(record);
        }
        Ok(records)
    }
}
