// src/extract/tree.rs
//! Reassembles a nested tree from stored records.
//!
//! The walk never holds the tree in memory; small-extraction callers that
//! want the reconstructed hierarchy get it from storage by following
//! `parent_id` edges collection by collection.

use crate::catalog::Collection;
use crate::error::AppError;
use crate::model::EntityKind;
use crate::store::{DocumentStore, Filter};
use crate::types::{EntityId, Username};
use serde::Serialize;
use std::collections::VecDeque;

/// One node of the reassembled tree.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedNode {
    pub entity_type: String,
    pub id: String,
    pub name: String,
    pub children: Vec<ExtractedNode>,
}

struct FlatNode {
    kind: EntityKind,
    node: ExtractedNode,
    parent: Option<usize>,
}

/// Rebuilds the subtree under a stored root entity.
pub async fn assemble_tree(
    store: &dyn DocumentStore,
    owner: &Username,
    root_kind: EntityKind,
    root_id: &EntityId,
) -> Result<ExtractedNode, AppError> {
    let root_collection = Collection::resolve(root_kind, None)?;
    let root_doc = store
        .find(
            root_collection,
            &Filter::new().owned_by(owner).field("id", root_id.as_str()),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AppError::Validation(format!(
                "{} {} has not been extracted for {}",
                root_kind, root_id, owner
            ))
        })?;

    let mut flat = vec![FlatNode {
        kind: root_kind,
        node: doc_to_node(root_kind, &root_doc),
        parent: None,
    }];

    // Breadth-first collection: parents always precede their children in
    // `flat`, which the bottom-up assembly below relies on.
    let mut queue = VecDeque::from([0usize]);
    while let Some(index) = queue.pop_front() {
        let kind = flat[index].kind;
        let id = flat[index].node.id.clone();

        for &child_kind in kind.child_kinds() {
            let collection = Collection::resolve(child_kind, Some(kind))?;
            let docs = store
                .find(
                    collection,
                    &Filter::new().owned_by(owner).field("parent_id", id.as_str()),
                )
                .await?;
            for doc in docs {
                let child_index = flat.len();
                flat.push(FlatNode {
                    kind: child_kind,
                    node: doc_to_node(child_kind, &doc),
                    parent: Some(index),
                });
                if !child_kind.child_kinds().is_empty() {
                    queue.push_back(child_index);
                }
            }
        }
    }

    // Bottom-up assembly: walking indices downward guarantees a node's
    // children are complete before the node moves into its parent.
    let mut assembled: Vec<Option<ExtractedNode>> = Vec::with_capacity(flat.len());
    let parents: Vec<Option<usize>> = flat.iter().map(|n| n.parent).collect();
    for flat_node in flat {
        assembled.push(Some(flat_node.node));
    }
    for index in (1..assembled.len()).rev() {
        let mut node = assembled[index].take().unwrap_or_else(|| ExtractedNode {
            entity_type: String::new(),
            id: String::new(),
            name: String::new(),
            children: Vec::new(),
        });
        node.children.reverse();
        if let Some(parent) = parents[index] {
            if let Some(parent_node) = assembled[parent].as_mut() {
                parent_node.children.push(node);
            }
        }
    }
    let mut root = assembled
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| AppError::InternalError {
            message: "tree assembly lost its root".to_string(),
            source: None,
        })?;
    root.children.reverse();
    Ok(root)
}

fn doc_to_node(kind: EntityKind, doc: &serde_json::Value) -> ExtractedNode {
    let text = |key: &str| {
        doc.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let mut entity_type = text("entity_type");
    if entity_type.is_empty() {
        entity_type = kind.storage_tag().to_string();
    }
    ExtractedNode {
        entity_type,
        id: text("id"),
        name: text("name"),
        children: Vec::new(),
    }
}
