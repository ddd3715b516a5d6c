// src/store/mod.rs
//! Document storage — the ability to persist and query extracted records.
//!
//! The engine never talks to a database driver directly: it consumes the
//! [`DocumentStore`] capability with three primitives (keyed upsert,
//! filtered find, filtered count) and nothing else. An in-memory
//! interpreter backs tests and the CLI export path.

mod memory;

use crate::catalog::Collection;
use crate::error::AppError;
use crate::types::Username;
use indexmap::IndexMap;
use serde_json::Value;

pub use memory::MemoryStore;

/// A stored document. Records are persisted in their JSON document shape
/// so the capability stays agnostic of the engine's structs.
pub type Document = Value;

/// Equality filter over top-level document keys.
///
/// This is the entire query language the engine needs; anything richer
/// belongs to the store behind the capability.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: IndexMap<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(name.into(), value.into());
        self
    }

    /// Scopes the filter to one owner user, the partition every record
    /// query starts from.
    pub fn owned_by(self, owner: &Username) -> Self {
        self.field("user", owner.as_str())
    }

    /// Whether a document satisfies every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(name, expected)| doc.get(name) == Some(expected))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Composite unique key for an entity record within its collection.
pub fn record_key(owner: &Username, id: &str) -> String {
    format!("{}::{}", owner, id)
}

/// The storage capability consumed by the engine.
///
/// `upsert` must replace the whole document on key conflict, never
/// duplicate-insert and never merge: concurrent writers of the same key
/// each leave a complete record behind.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upsert(
        &self,
        collection: Collection,
        key: &str,
        document: Document,
    ) -> Result<(), AppError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, AppError>;

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, AppError>;
}
