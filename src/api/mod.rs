// src/api/mod.rs
//! Upstream ALM interaction — the ability to list entities and download
//! attachment content from a Quality-Center-like server.
//!
//! Business logic depends on the capability traits here, never on HTTP
//! details. The session token is an explicit argument on every call.

pub mod client;
pub mod pagination;
pub mod session;

use crate::error::AppError;
use crate::model::{AttachmentContent, EntityKind, EntityPage};
use crate::types::{AttachmentId, Credentials, EntityId, Scope, SessionToken};
use serde_json::Value;

/// Which slice of an entity kind a list call asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    /// Every entity of the kind within the scope.
    All,
    /// Exactly one entity, by its id.
    ById(EntityId),
    /// Immediate children of a parent entity. The client maps this to the
    /// kind-specific query field (`parent-id`, `cycle-id`, `testcycl-id`).
    ByParent(EntityId),
    /// Attachments of one parent entity; the parent kind selects the
    /// upstream `parent-type` filter value.
    AttachmentsOf {
        parent_id: EntityId,
        parent_kind: EntityKind,
    },
}

/// The ability to read entities from the upstream system.
#[async_trait::async_trait]
pub trait AlmApi: Send + Sync {
    /// Fetches one page of a list, `page_size` records starting at the
    /// 1-based `start_index`.
    async fn list_page(
        &self,
        session: &SessionToken,
        scope: &Scope,
        kind: EntityKind,
        filter: &ListFilter,
        start_index: u32,
        page_size: u32,
    ) -> Result<EntityPage, AppError>;

    /// Fetches a flat, unpaginated `results`-format list (domains, and
    /// projects of a domain).
    async fn list_flat(
        &self,
        session: &SessionToken,
        kind: EntityKind,
        domain: Option<&str>,
    ) -> Result<Vec<Value>, AppError>;

    /// Downloads the binary content of one attachment.
    async fn download_attachment(
        &self,
        session: &SessionToken,
        scope: &Scope,
        id: &AttachmentId,
    ) -> Result<AttachmentContent, AppError>;
}

/// The ability to open and close upstream sessions.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, AppError>;
    async fn logout(&self, session: &SessionToken) -> Result<(), AppError>;
}

pub use client::AlmHttpClient;
pub use pagination::fetch_all_pages;
pub use session::SessionHandle;
