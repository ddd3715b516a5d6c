// src/store/memory.rs
//! In-memory interpreter of the storage capability.
//!
//! Backs the test suite and the CLI's export path. Collections are
//! insertion-ordered maps so exports and assertions see records in the
//! order they were written.

use super::{Document, DocumentStore, Filter};
use crate::catalog::Collection;
use crate::error::AppError;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A process-local document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, IndexMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .get(collection.as_str())
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Snapshot of a whole collection, in insertion order.
    pub fn dump(&self, collection: Collection) -> Vec<Document> {
        self.collections
            .read()
            .get(collection.as_str())
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(
        &self,
        collection: Collection,
        key: &str,
        document: Document,
    ) -> Result<(), AppError> {
        let mut collections = self.collections.write();
        collections
            .entry(collection.as_str())
            .or_default()
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection.as_str())
            .map(|c| {
                c.values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, AppError> {
        Ok(self.find(collection, filter).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record_key;
    use crate::types::Username;
    use serde_json::json;

    fn owner() -> Username {
        Username::new("tester").unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_on_key_conflict() {
        let store = MemoryStore::new();
        let key = record_key(&owner(), "1");

        store
            .upsert(Collection::TestplanFolders, &key, json!({"id": "1", "name": "old"}))
            .await
            .unwrap();
        store
            .upsert(Collection::TestplanFolders, &key, json!({"id": "1", "name": "new"}))
            .await
            .unwrap();

        assert_eq!(store.len(Collection::TestplanFolders), 1);
        assert_eq!(store.dump(Collection::TestplanFolders)[0]["name"], "new");
    }

    #[tokio::test]
    async fn find_applies_equality_conditions() {
        let store = MemoryStore::new();
        for (id, parent) in [("1", "0"), ("2", "1"), ("3", "1")] {
            store
                .upsert(
                    Collection::TestplanFolders,
                    &record_key(&owner(), id),
                    json!({"user": "tester", "id": id, "parent_id": parent}),
                )
                .await
                .unwrap();
        }

        let children = store
            .find(
                Collection::TestplanFolders,
                &Filter::new().owned_by(&owner()).field("parent_id", "1"),
            )
            .await
            .unwrap();
        assert_eq!(children.len(), 2);

        let none = store
            .find(
                Collection::TestplanFolders,
                &Filter::new().field("user", "someone-else"),
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = MemoryStore::new();
        store
            .upsert(
                Collection::TestplanTestAttachments,
                &record_key(&owner(), "9"),
                json!({"id": "9"}),
            )
            .await
            .unwrap();

        assert_eq!(store.len(Collection::TestplanTestAttachments), 1);
        assert!(store.is_empty(Collection::TestplanFolderAttachments));
    }
}
