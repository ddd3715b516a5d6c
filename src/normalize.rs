// src/normalize.rs
//! Converts raw upstream records into standardized entity records.
//!
//! Normalization is a pure function: no I/O, deterministic for identical
//! inputs. Configured fields come first in catalog order with their
//! aliases and visibility; any extra field the upstream returned is kept
//! for full fidelity, appended after the configured ones in order of
//! appearance and flagged not-visible.

use crate::catalog::{field_config, Collection};
use crate::error::AppError;
use crate::model::{EntityKind, EntityRecord, FieldValue, RawEntity};
use crate::types::{EntityId, Username};
use serde_json::Value;

/// Normalizes one raw upstream record.
///
/// `parent_id` is the parent known from the walk; when absent, the
/// record's own `parent-id` field is used. `parent_kind` is required for
/// attachments (it selects both the target collection and the stored
/// `entity_type` tag) and ignored otherwise.
pub fn normalize(
    kind: EntityKind,
    parent_kind: Option<EntityKind>,
    raw: &RawEntity,
    owner: &Username,
    parent_id: Option<&EntityId>,
) -> Result<EntityRecord, AppError> {
    let collection = Collection::resolve(kind, parent_kind)?;

    let id = raw
        .field_str("id")
        .ok_or_else(|| {
            AppError::MalformedResponse(format!("{} record without an id field", kind))
        })
        .and_then(EntityId::new)?;
    let name = raw.field_str("name").unwrap_or_default();
    let parent_id = match parent_id {
        Some(p) => Some(p.clone()),
        None => raw.field_str("parent-id").map(EntityId::new).transpose()?,
    };

    let entity_type = match kind {
        EntityKind::Attachment => parent_kind
            .and_then(|p| p.attachment_tag())
            // resolve() above already rejected unroutable parents
            .unwrap_or("attachment")
            .to_string(),
        other => other.storage_tag().to_string(),
    };

    let mut fields = Vec::with_capacity(raw.fields.len() + 4);
    let config = field_config(collection);

    for field_spec in config {
        let value = match field_spec.field {
            "user" => Some(Value::String(owner.to_string())),
            "id" => Some(Value::String(id.to_string())),
            "name" => Some(Value::String(name.clone())),
            "parent_id" => parent_id.as_ref().map(|p| Value::String(p.to_string())),
            "parent-type" => parent_kind
                .and_then(|p| p.upstream_parent_type())
                .map(|t| Value::String(t.to_string()))
                .or_else(|| raw.field_value("parent-type").cloned()),
            upstream_name => raw.field_value(upstream_name).cloned(),
        };
        fields.push(FieldValue {
            field: field_spec.field.to_string(),
            alias: field_spec.alias.to_string(),
            sequence: field_spec.sequence,
            display: field_spec.display,
            value,
        });
    }

    // Structural fields are visible no matter what the catalog says:
    // identity and parent chain are required by every downstream query.
    for field in fields.iter_mut() {
        if matches!(field.field.as_str(), "user" | "id" | "name" | "parent_id") {
            field.display = true;
        }
    }

    // Full fidelity: carry unconfigured upstream fields through, hidden,
    // ordered by appearance after the configured ones.
    let mut next_sequence = config.iter().map(|s| s.sequence).max().unwrap_or(0);
    for raw_field in &raw.fields {
        if config.iter().any(|s| s.field == raw_field.name) {
            continue;
        }
        next_sequence += 1;
        fields.push(FieldValue {
            field: raw_field.name.clone(),
            alias: raw_field.name.clone(),
            sequence: next_sequence,
            display: false,
            value: raw_field
                .values
                .first()
                .and_then(|v| v.value.clone())
                .filter(|v| !v.is_null()),
        });
    }

    Ok(EntityRecord {
        owner: owner.clone(),
        id,
        name,
        parent_id,
        entity_type,
        fields,
    })
}

/// Normalizes one record of the flat `results` format the upstream uses
/// for domains and projects: `{"name": "..."}` with no id of its own, so
/// the name doubles as the identifier.
pub fn normalize_flat(
    kind: EntityKind,
    raw: &Value,
    owner: &Username,
    parent_id: Option<&EntityId>,
) -> Result<EntityRecord, AppError> {
    let collection = Collection::resolve(kind, None)?;
    let name = raw
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AppError::MalformedResponse(format!("{} record without a name field", kind))
        })?
        .to_string();
    let id = EntityId::new(name.clone())?;
    let parent_id = parent_id.cloned();

    let fields = field_config(collection)
        .iter()
        .map(|field_spec| FieldValue {
            field: field_spec.field.to_string(),
            alias: field_spec.alias.to_string(),
            sequence: field_spec.sequence,
            display: field_spec.display,
            value: match field_spec.field {
                "user" => Some(Value::String(owner.to_string())),
                "id" => Some(Value::String(id.to_string())),
                "name" => Some(Value::String(name.clone())),
                "parent_id" => parent_id.as_ref().map(|p| Value::String(p.to_string())),
                other => raw.get(other).cloned().filter(|v| !v.is_null()),
            },
        })
        .collect();

    Ok(EntityRecord {
        owner: owner.clone(),
        id,
        name,
        parent_id,
        entity_type: kind.storage_tag().to_string(),
        fields,
    })
}
