// src/extract/context.rs
//! Immutable walk context carried by every worklist step.

use crate::constants::MAX_WALK_DEPTH;
use crate::model::EntityKind;
use crate::types::EntityId;

/// Per-branch state of a recursive walk.
///
/// The visited set is persistent (structurally shared), so cloning the
/// context for each child step is cheap. It accumulates along one
/// ancestry path, which is exactly where a cyclic parent reference would
/// show up.
#[derive(Debug, Clone)]
pub struct WalkContext {
    visited: im::HashSet<(EntityKind, EntityId)>,
    pub depth_remaining: u8,
}

impl WalkContext {
    /// Context for a walk root, with the engine's depth ceiling.
    pub fn root() -> Self {
        Self::with_depth(MAX_WALK_DEPTH)
    }

    /// Context with an explicit depth budget, clamped to the ceiling.
    pub fn with_depth(depth: u8) -> Self {
        let safe_depth = depth.min(MAX_WALK_DEPTH);
        if depth > safe_depth {
            log::warn!(
                "Requested walk depth {} exceeds ceiling {}, clamping",
                depth,
                safe_depth
            );
        }
        Self {
            visited: im::HashSet::new(),
            depth_remaining: safe_depth,
        }
    }

    /// Whether this node has already been seen on the current path.
    pub fn already_visited(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.visited.contains(&(kind, id.clone()))
    }

    /// Returns a context with the node marked visited.
    pub fn visit(self, kind: EntityKind, id: EntityId) -> Self {
        let mut visited = self.visited;
        visited.insert((kind, id));
        Self { visited, ..self }
    }

    /// Context for a child step, one level deeper.
    pub fn descend(&self) -> Self {
        Self {
            visited: self.visited.clone(),
            depth_remaining: self.depth_remaining.saturating_sub(1),
        }
    }

    /// Whether descent below this node is still allowed.
    pub fn depth_exhausted(&self) -> bool {
        self.depth_remaining == 0
    }
}
