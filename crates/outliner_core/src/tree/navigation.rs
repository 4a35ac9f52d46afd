//! Keyboard navigation over the visible outline.
//!
//! Visible order is a pre-order walk of children lists, descending only into
//! expanded nodes. Side-lists are not part of the walk.

use crate::tree::representation::{NodeRef, Tree};

fn visible_children(tree: &Tree, node: NodeRef) -> &[NodeRef] {
    if tree.expanded(node) {
        tree.children(node)
    } else {
        &[]
    }
}

pub fn previous_sibling(tree: &Tree, node: NodeRef) -> Option<NodeRef> {
    let parent = tree.structural_parent(node)?;
    let index = tree.index_in_parent(node)?;
    index
        .checked_sub(1)
        .and_then(|i| tree.children(parent).get(i).copied())
}

pub fn next_sibling(tree: &Tree, node: NodeRef) -> Option<NodeRef> {
    let parent = tree.structural_parent(node)?;
    let index = tree.index_in_parent(node)?;
    tree.children(parent).get(index + 1).copied()
}

/// Returns the item shown directly above `node`.
///
/// Nodes without a structural parent (the root, side-list entries) have no
/// previous item and return themselves.
pub fn previous_visible_item(tree: &Tree, node: NodeRef) -> NodeRef {
    let Some(parent) = tree.structural_parent(node) else {
        return node;
    };
    let Some(mut result) = previous_sibling(tree, node) else {
        return parent;
    };
    while let Some(last) = visible_children(tree, result).last() {
        result = *last;
    }
    result
}

/// Returns the item shown directly below `node`, or `node` itself at the end
/// of the outline.
pub fn next_visible_item(tree: &Tree, node: NodeRef) -> NodeRef {
    if let Some(first) = visible_children(tree, node).first() {
        return *first;
    }

    let mut current = node;
    while current != tree.root() {
        if let Some(sibling) = next_sibling(tree, current) {
            return sibling;
        }
        match tree.structural_parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    node
}
