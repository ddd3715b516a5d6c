// src/types/ids.rs
//! Identifier newtypes.
//!
//! Upstream entity ids are opaque strings assigned by the ALM server
//! (numeric for most kinds, names for domains/projects). Job ids are
//! minted locally as UUIDs.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an upstream entity, unique within (owner, entity kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps a non-empty upstream identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation("entity id must not be empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an attachment in the upstream system.
///
/// Attachments get their own id type because they cross two keyspaces:
/// the metadata record keyed like any entity, and the binary cache keyed
/// by (scope, attachment id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "attachment id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&EntityId> for AttachmentId {
    fn from(id: &EntityId) -> Self {
        Self(id.as_str().to_string())
    }
}

/// Identifier of a tracked extraction job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mints a fresh job id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a job id previously handed to a poller.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid job id: {}", input)))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
