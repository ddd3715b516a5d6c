// src/model/record.rs
//! Standardized records persisted by the engine.
//!
//! Every extracted entity lands in storage with the same shape: a closed
//! set of structural fields plus an open, ordered list of
//! (name, alias, order, visible, value) tuples. Commonly queried field
//! values are mirrored as top-level document keys, always redundantly
//! with their `fields` entry.

use crate::types::{AttachmentId, EntityId, Username};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One attribute of an entity, carrying its display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field: String,
    pub alias: String,
    pub sequence: u32,
    pub display: bool,
    pub value: Option<Value>,
}

/// A normalized entity ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub owner: Username,
    pub id: EntityId,
    pub name: String,
    pub parent_id: Option<EntityId>,
    /// Storage tag: `folder`, `test`, `test-attachment`, ...
    pub entity_type: String,
    /// Every attribute the upstream returned, configured fields first.
    pub fields: Vec<FieldValue>,
}

impl EntityRecord {
    /// Renders the record as the document written to storage.
    ///
    /// Structural keys come first, then the `fields` array, then a
    /// top-level mirror of each valued field so downstream queries can
    /// filter without unpacking the array. Structural keys win any name
    /// collision with a mirrored field.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("user".to_string(), Value::String(self.owner.to_string()));
        doc.insert("id".to_string(), Value::String(self.id.to_string()));
        doc.insert("name".to_string(), Value::String(self.name.clone()));
        doc.insert(
            "parent_id".to_string(),
            match &self.parent_id {
                Some(p) => Value::String(p.to_string()),
                None => Value::Null,
            },
        );
        doc.insert(
            "entity_type".to_string(),
            Value::String(self.entity_type.clone()),
        );
        doc.insert(
            "fields".to_string(),
            serde_json::to_value(&self.fields).unwrap_or(Value::Null),
        );
        for field in &self.fields {
            if let Some(value) = &field.value {
                doc.entry(field.field.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        Value::Object(doc)
    }

    /// Alias-keyed projection of the visible fields, sorted by sequence.
    /// This is the shape a display layer consumes.
    pub fn display_fields(&self) -> IndexMap<String, Value> {
        let mut visible: Vec<&FieldValue> =
            self.fields.iter().filter(|f| f.display).collect();
        visible.sort_by_key(|f| f.sequence);
        visible
            .into_iter()
            .map(|f| (f.alias.clone(), f.value.clone().unwrap_or(Value::Null)))
            .collect()
    }

    /// The `file-size` attribute, for attachment records.
    pub fn file_size(&self) -> Option<u64> {
        self.fields
            .iter()
            .find(|f| f.field == "file-size")
            .and_then(|f| f.value.as_ref())
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
    }
}

/// Downloaded attachment content as returned by the upstream.
#[derive(Debug, Clone)]
pub struct AttachmentContent {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// A cached attachment binary, keyed by (scope, attachment id).
///
/// Created on first download and never mutated afterward. The binary is
/// carried as base64 text because the stored document is JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentCacheEntry {
    pub user: Username,
    pub scope_id: String,
    pub attachment_id: AttachmentId,
    pub filename: String,
    pub content_type: Option<String>,
    pub content: String,
    pub size: u64,
    pub downloaded_at: DateTime<Utc>,
}
