// src/extract/steps.rs
//! Worklist items for the recursive walk.
//!
//! The walk is an explicit LIFO stack of these steps rather than native
//! recursion, which makes the depth ceiling and skip decisions plain
//! data and keeps the call stack flat no matter how deep the tree is.

use super::context::WalkContext;
use crate::model::EntityKind;
use crate::types::EntityId;
use std::fmt;

/// One node awaiting expansion.
#[derive(Debug, Clone)]
pub struct WalkStep {
    pub kind: EntityKind,
    pub id: EntityId,
    pub context: WalkContext,
}

impl WalkStep {
    pub fn new(kind: EntityKind, id: EntityId, context: WalkContext) -> Self {
        Self { kind, id, context }
    }
}

/// Why a step was not expanded. Skips are boundary conditions recorded
/// on the job, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The node was already seen on this path: a cyclic parent reference.
    AlreadyVisited(EntityKind, EntityId),
    /// The depth ceiling stopped further descent below this node.
    DepthExhausted(EntityKind, EntityId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyVisited(kind, id) => {
                write!(f, "{} {} already visited on this path, skipping", kind, id)
            }
            Self::DepthExhausted(kind, id) => write!(
                f,
                "depth ceiling reached at {} {}, subtree not expanded",
                kind, id
            ),
        }
    }
}
