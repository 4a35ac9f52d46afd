//! Structural editor over a graph and its tree projection.
//!
//! # Responsibility
//! - Apply indent/unindent/move/copy/create/remove/destroy/replace edits to
//!   the graph.
//! - Fan each edit out to every tree instance of the affected things.
//!
//! # Invariants
//! - Inputs are never mutated; every operation works on copies and returns a
//!   complete `(Graph, Tree)` pair, or an error and no state at all.
//! - After an edit, every expanded instance of an edited parent lists the
//!   same things, in the same order, as the graph.
//! - A moved node keeps its numeric id, subtree and fold state.
//!
//! # See also
//! - `tree::projection` for the refresh policy used as a fallback.

use crate::model::content::{is_blank, ThingId};
use crate::model::graph::{Graph, GraphError, ROOT_THING};
use crate::tree::navigation::{
    next_visible_item, previous_sibling, previous_visible_item,
};
use crate::tree::projection;
use crate::tree::representation::{ListKind, NodeKind, NodeRef, NodeSource, Tree};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by structural editor operations.
pub type EditResult<T> = Result<T, EditError>;

/// Errors from structural editor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Node is not live in the given tree.
    NodeNotFound(NodeRef),
    /// Operation needs the node's structural parent and it has none.
    NoStructuralParent(NodeRef),
    /// Focus navigation was requested with nothing focused.
    NothingFocused,
    /// Graph store rejected the mutation.
    Graph(GraphError),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(node) => write!(f, "tree node not found: {node}"),
            Self::NoStructuralParent(node) => {
                write!(f, "tree node has no structural parent: {node}")
            }
            Self::NothingFocused => write!(f, "cannot move focus because nothing is focused"),
            Self::Graph(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for EditError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

/// Target position for move and copy: `index` among `parent`'s children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub parent: NodeRef,
    pub index: usize,
}

/// Outcome of one structural edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub graph: Graph,
    pub tree: Tree,
    /// Node the edit produced or landed on, when there is one.
    pub node: Option<NodeRef>,
}

impl Edit {
    fn unchanged(graph: &Graph, tree: &Tree, node: NodeRef) -> Self {
        Self {
            graph: graph.clone(),
            tree: tree.clone(),
            node: Some(node),
        }
    }
}

fn require(tree: &Tree, node: NodeRef) -> EditResult<ThingId> {
    if !tree.exists(node) {
        return Err(EditError::NodeNotFound(node));
    }
    tree.thing(node)
        .map(str::to_string)
        .ok_or(EditError::NodeNotFound(node))
}

/// Position of `node`'s connection among `parent_thing`'s children, falling
/// back to the node's position in the tree.
fn connection_index(graph: &Graph, tree: &Tree, parent_thing: &str, node: NodeRef) -> Option<usize> {
    tree.connection(node)
        .and_then(|connection| {
            graph
                .child_connections(parent_thing)
                .iter()
                .position(|c| c == connection)
        })
        .or_else(|| tree.index_in_parent(node))
}

fn child_things(tree: &Tree, node: NodeRef) -> Vec<ThingId> {
    tree.children(node)
        .iter()
        .filter_map(|n| tree.thing(*n))
        .map(str::to_string)
        .collect()
}

/// Whether inserting `target[index]` at `index` brings `instance` in line
/// with `target`.
fn insertion_matches(tree: &Tree, instance: NodeRef, index: usize, target: &[ThingId]) -> bool {
    let mut expected = child_things(tree, instance);
    let Some(inserted) = target.get(index) else {
        return false;
    };
    if index > expected.len() {
        return false;
    }
    expected.insert(index, inserted.clone());
    expected == target
}

/// Drops the child at `index` from every instance of `parent_thing` that
/// still shows `thing` there; other instances are refreshed.
fn splice_from_instances(
    graph: &Graph,
    tree: &mut Tree,
    parent_thing: &str,
    index: usize,
    thing: &str,
    skip: Option<NodeRef>,
) {
    for instance in tree.instances(parent_thing) {
        if Some(instance) == skip || !tree.exists(instance) {
            continue;
        }
        let shows_thing = tree
            .children(instance)
            .get(index)
            .and_then(|n| tree.thing(*n))
            .is_some_and(|t| t == thing);
        if shows_thing {
            tree.detach_from_list(instance, ListKind::Children, index);
        } else {
            projection::refresh_children(graph, tree, instance);
        }
    }
}

/// Loads the new connection at `index` into every expanded instance of
/// `parent_thing`; instances that were out of step are refreshed instead.
fn insert_into_instances(
    graph: &Graph,
    tree: &mut Tree,
    parent_thing: &str,
    index: usize,
    connection: &str,
    skip: Option<NodeRef>,
) {
    let target = graph.children(parent_thing);
    for instance in tree.instances(parent_thing) {
        if Some(instance) == skip || !tree.exists(instance) || !tree.expanded(instance) {
            continue;
        }
        if insertion_matches(tree, instance, index, &target) {
            let child = projection::load(
                graph,
                tree,
                &target[index],
                NodeSource::Child { parent: instance },
                Some(connection.to_string()),
            );
            tree.insert_into_list(instance, ListKind::Children, index, child);
        } else {
            projection::refresh_children(graph, tree, instance);
        }
    }
}

fn refresh_other_parents_of(graph: &Graph, tree: &mut Tree, thing: &str) {
    for instance in tree.instances(thing) {
        if tree.exists(instance) {
            projection::refresh_other_parents(graph, tree, instance);
        }
    }
}

fn refresh_children_of(graph: &Graph, tree: &mut Tree, thing: &str) {
    for instance in tree.instances(thing) {
        if tree.exists(instance) {
            projection::refresh_children(graph, tree, instance);
        }
    }
}

// Moving

/// Moves `node` to `destination`, keeping the moved node's id.
///
/// The destination parent is expanded first. Every instance of the old
/// parent drops the thing and every expanded instance of the new parent
/// gains it. The returned node is the moved node at its new position.
///
/// No-op for nodes without a structural parent (the root included) and for
/// destinations inside the moved node itself. The graph store on its own
/// would accept such a move and simply record a cycle; this editor refuses
/// it so a move never makes a node its own descendant in the tree. Cycles
/// can still be built by connecting an existing thing as a child.
pub fn move_node(
    graph: &Graph,
    tree: &Tree,
    node: NodeRef,
    destination: Destination,
) -> EditResult<Edit> {
    let thing = require(tree, node)?;
    let Some(old_parent) = tree.structural_parent(node) else {
        debug!("event=tree_move module=editor status=skipped reason=no_parent node={node}");
        return Ok(Edit::unchanged(graph, tree, node));
    };
    let destination_thing = require(tree, destination.parent)?;
    if tree.is_ancestor_or_self(node, destination.parent) {
        warn!("event=tree_move module=editor status=skipped reason=into_own_subtree node={node}");
        return Ok(Edit::unchanged(graph, tree, node));
    }
    let old_parent_thing = require(tree, old_parent)?;
    let old_index = connection_index(graph, tree, &old_parent_thing, node)
        .ok_or(EditError::NoStructuralParent(node))?;

    let mut next_graph = graph.clone();
    let mut next_tree = tree.clone();
    projection::expand(graph, &mut next_tree, destination.parent);

    next_graph.remove_child(&old_parent_thing, old_index)?;
    let connection =
        next_graph.insert_child(&destination_thing, &thing, destination.index, None)?;

    let moving = next_tree
        .index_in_parent(node)
        .and_then(|index| next_tree.take_from_list(old_parent, ListKind::Children, index));
    splice_from_instances(
        &next_graph,
        &mut next_tree,
        &old_parent_thing,
        old_index,
        &thing,
        Some(old_parent),
    );

    let mut placed = None;
    if let Some(moving) = moving {
        let target = next_graph.children(&destination_thing);
        let fits = next_tree.exists(destination.parent)
            && next_tree.expanded(destination.parent)
            && insertion_matches(&next_tree, destination.parent, destination.index, &target);
        if fits {
            next_tree.set_source(moving, NodeSource::Child { parent: destination.parent });
            next_tree.set_connection(moving, Some(connection.clone()));
            next_tree.insert_into_list(
                destination.parent,
                ListKind::Children,
                destination.index,
                moving,
            );
            placed = Some(moving);
        } else {
            next_tree.release(moving);
        }
    }
    insert_into_instances(
        &next_graph,
        &mut next_tree,
        &destination_thing,
        destination.index,
        &connection,
        placed.map(|_| destination.parent),
    );
    refresh_other_parents_of(&next_graph, &mut next_tree, &thing);

    let result = placed.or_else(|| {
        next_tree
            .exists(destination.parent)
            .then(|| next_tree.children(destination.parent).get(destination.index).copied())
            .flatten()
    });
    if tree.has_focus(node) {
        if let Some(result) = result {
            next_tree.focus(result);
        }
    }

    debug!("event=tree_move module=editor status=ok node={node}");
    Ok(Edit {
        graph: next_graph,
        tree: next_tree,
        node: result,
    })
}

/// Moves `source` to the position currently held by `destination_node`.
pub fn move_to_above(
    graph: &Graph,
    tree: &Tree,
    source: NodeRef,
    destination_node: NodeRef,
) -> EditResult<Edit> {
    require(tree, source)?;
    let Some(parent) = tree.structural_parent(destination_node) else {
        return Ok(Edit::unchanged(graph, tree, source));
    };
    let parent_thing = require(tree, parent)?;
    let Some(index) = connection_index(graph, tree, &parent_thing, destination_node) else {
        return Ok(Edit::unchanged(graph, tree, source));
    };
    move_node(graph, tree, source, Destination { parent, index })
}

pub fn move_up(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    require(tree, node)?;
    let (Some(parent), Some(index)) = (tree.structural_parent(node), tree.index_in_parent(node))
    else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    if index == 0 {
        return Ok(Edit::unchanged(graph, tree, node));
    }
    move_node(graph, tree, node, Destination { parent, index: index - 1 })
}

pub fn move_down(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    require(tree, node)?;
    let (Some(parent), Some(index)) = (tree.structural_parent(node), tree.index_in_parent(node))
    else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    if index + 1 >= tree.children(parent).len() {
        return Ok(Edit::unchanged(graph, tree, node));
    }
    move_node(graph, tree, node, Destination { parent, index: index + 1 })
}

/// Makes `node` the last child of its previous sibling.
pub fn indent(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    require(tree, node)?;
    let Some(previous) = previous_sibling(tree, node) else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    let previous_thing = require(tree, previous)?;
    let index = graph.child_connections(&previous_thing).len();
    move_node(graph, tree, node, Destination { parent: previous, index })
}

/// Makes `node` the sibling right after its parent.
pub fn unindent(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    require(tree, node)?;
    let Some(parent) = tree.structural_parent(node) else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    let Some(grandparent) = tree.structural_parent(parent) else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    let grandparent_thing = require(tree, grandparent)?;
    let Some(index) = connection_index(graph, tree, &grandparent_thing, parent) else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    move_node(
        graph,
        tree,
        node,
        Destination {
            parent: grandparent,
            index: index + 1,
        },
    )
}

// Copying

/// Adds another placement of `node`'s thing at `destination`.
///
/// Existing placements keep their nodes; the returned node is the new one.
pub fn copy(
    graph: &Graph,
    tree: &Tree,
    node: NodeRef,
    destination: Destination,
) -> EditResult<Edit> {
    let thing = require(tree, node)?;
    let destination_thing = require(tree, destination.parent)?;

    let mut next_graph = graph.clone();
    let mut next_tree = tree.clone();
    projection::expand(graph, &mut next_tree, destination.parent);
    let connection =
        next_graph.insert_child(&destination_thing, &thing, destination.index, None)?;

    insert_into_instances(
        &next_graph,
        &mut next_tree,
        &destination_thing,
        destination.index,
        &connection,
        None,
    );
    refresh_other_parents_of(&next_graph, &mut next_tree, &thing);

    let result = next_tree
        .children(destination.parent)
        .get(destination.index)
        .copied();
    debug!("event=tree_copy module=editor status=ok node={node}");
    Ok(Edit {
        graph: next_graph,
        tree: next_tree,
        node: result,
    })
}

pub fn copy_to_above(
    graph: &Graph,
    tree: &Tree,
    source: NodeRef,
    destination_node: NodeRef,
) -> EditResult<Edit> {
    require(tree, source)?;
    let Some(parent) = tree.structural_parent(destination_node) else {
        return Ok(Edit::unchanged(graph, tree, source));
    };
    let parent_thing = require(tree, parent)?;
    let Some(index) = connection_index(graph, tree, &parent_thing, destination_node) else {
        return Ok(Edit::unchanged(graph, tree, source));
    };
    copy(graph, tree, source, Destination { parent, index })
}

// Creating and inserting

/// Creates an empty thing as `node`'s first child and focuses it.
pub fn create_child(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    require(tree, node)?;
    let mut with_thing = graph.clone();
    let child = with_thing.create(None)?;
    insert_child(&with_thing, tree, node, &child, 0)
}

/// Creates an empty thing right before `node` and focuses it.
///
/// # Errors
/// - `NoStructuralParent` when `node` is not a child node.
pub fn create_sibling_before(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    create_sibling(graph, tree, node, 0)
}

/// Creates an empty thing right after `node` and focuses it.
///
/// # Errors
/// - `NoStructuralParent` when `node` is not a child node.
pub fn create_sibling_after(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    create_sibling(graph, tree, node, 1)
}

fn create_sibling(graph: &Graph, tree: &Tree, node: NodeRef, offset: usize) -> EditResult<Edit> {
    require(tree, node)?;
    let parent = tree
        .structural_parent(node)
        .ok_or(EditError::NoStructuralParent(node))?;
    let parent_thing = require(tree, parent)?;
    let index = connection_index(graph, tree, &parent_thing, node)
        .ok_or(EditError::NoStructuralParent(node))?
        + offset;

    let mut next_graph = graph.clone();
    let mut next_tree = tree.clone();
    let thing = next_graph.create(None)?;
    let connection = next_graph.insert_child(&parent_thing, &thing, index, None)?;

    let new_node = projection::load(
        &next_graph,
        &mut next_tree,
        &thing,
        NodeSource::Child { parent },
        Some(connection.clone()),
    );
    next_tree.insert_into_list(parent, ListKind::Children, index, new_node);
    next_tree.focus(new_node);
    insert_into_instances(
        &next_graph,
        &mut next_tree,
        &parent_thing,
        index,
        &connection,
        Some(parent),
    );

    debug!("event=tree_create module=editor status=ok node={new_node}");
    Ok(Edit {
        graph: next_graph,
        tree: next_tree,
        node: Some(new_node),
    })
}

/// Inserts the existing thing `child` under `node` at `position` and focuses
/// the new node.
///
/// # Errors
/// - `Graph(ChildIndexOutOfRange)` when `position` is past the end.
pub fn insert_child(
    graph: &Graph,
    tree: &Tree,
    node: NodeRef,
    child: &str,
    position: usize,
) -> EditResult<Edit> {
    let thing = require(tree, node)?;

    let mut next_graph = graph.clone();
    let connection = next_graph.insert_child(&thing, child, position, None)?;

    let mut next_tree = tree.clone();
    projection::expand(graph, &mut next_tree, node);

    let child_node = projection::load(
        &next_graph,
        &mut next_tree,
        child,
        NodeSource::Child { parent: node },
        Some(connection.clone()),
    );
    next_tree.insert_into_list(node, ListKind::Children, position, child_node);
    next_tree.focus(child_node);

    insert_into_instances(
        &next_graph,
        &mut next_tree,
        &thing,
        position,
        &connection,
        Some(node),
    );
    refresh_other_parents_of(&next_graph, &mut next_tree, child);

    debug!("event=tree_insert module=editor status=ok node={child_node}");
    Ok(Edit {
        graph: next_graph,
        tree: next_tree,
        node: Some(child_node),
    })
}

/// Inserts the existing thing `sibling` right after `node`.
///
/// No-op when `node` has no structural parent.
pub fn insert_sibling_after(
    graph: &Graph,
    tree: &Tree,
    node: NodeRef,
    sibling: &str,
) -> EditResult<Edit> {
    require(tree, node)?;
    let (Some(parent), Some(index)) = (tree.structural_parent(node), tree.index_in_parent(node))
    else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    insert_child(graph, tree, parent, sibling, index + 1)
}

/// Adds `node`'s thing as the last child of `parent` without moving `node`.
///
/// # Errors
/// - `Graph(ThingNotFound)` when `parent` does not exist.
pub fn insert_parent(graph: &Graph, tree: &Tree, node: NodeRef, parent: &str) -> EditResult<Edit> {
    let thing = require(tree, node)?;

    let mut next_graph = graph.clone();
    next_graph.add_child(parent, &thing, None)?;

    let mut next_tree = tree.clone();
    refresh_other_parents_of(&next_graph, &mut next_tree, &thing);
    refresh_children_of(&next_graph, &mut next_tree, parent);

    Ok(Edit {
        graph: next_graph,
        tree: next_tree,
        node: Some(node),
    })
}

// Removing

/// Removes the one connection `node` stands for.
///
/// A child node is disconnected from its structural parent; an inline
/// "other parent" node is disconnected from the item it is shown under.
/// Nodes of other kinds are left alone.
pub fn remove(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    require(tree, node)?;
    match tree.kind(node) {
        Some(NodeKind::Child) => remove_child_node(graph, tree, node),
        Some(NodeKind::Parent) => remove_parent_node(graph, tree, node),
        kind => {
            debug!("event=tree_remove module=editor status=skipped reason=kind kind={kind:?}");
            Ok(Edit::unchanged(graph, tree, node))
        }
    }
}

fn remove_child_node(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    let thing = require(tree, node)?;
    let parent = tree
        .structural_parent(node)
        .ok_or(EditError::NoStructuralParent(node))?;
    let parent_thing = require(tree, parent)?;
    let index = connection_index(graph, tree, &parent_thing, node)
        .ok_or(EditError::NoStructuralParent(node))?;

    let mut next_graph = graph.clone();
    next_graph.remove_child(&parent_thing, index)?;

    let mut next_tree = tree.clone();
    let focus = previous_visible_item(tree, node);
    next_tree.focus(focus);
    splice_from_instances(&next_graph, &mut next_tree, &parent_thing, index, &thing, None);
    refresh_other_parents_of(&next_graph, &mut next_tree, &thing);

    debug!("event=tree_remove module=editor status=ok node={node}");
    Ok(Edit {
        node: next_tree.focused(),
        graph: next_graph,
        tree: next_tree,
    })
}

fn remove_parent_node(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    let parent_thing = require(tree, node)?;
    let Some(NodeSource::OtherParent { parent: owner }) = tree.source(node) else {
        return Ok(Edit::unchanged(graph, tree, node));
    };
    let owner_thing = require(tree, owner)?;
    let Some(index) = graph
        .children(&parent_thing)
        .iter()
        .position(|child| *child == owner_thing)
    else {
        warn!("event=tree_remove module=editor status=degraded reason=stale_parent node={node}");
        return Ok(Edit::unchanged(graph, tree, node));
    };

    let mut next_graph = graph.clone();
    next_graph.remove_child(&parent_thing, index)?;

    let mut next_tree = tree.clone();
    next_tree.focus(owner);
    splice_from_instances(&next_graph, &mut next_tree, &parent_thing, index, &owner_thing, None);
    refresh_other_parents_of(&next_graph, &mut next_tree, &owner_thing);

    debug!("event=tree_remove module=editor status=ok node={node}");
    Ok(Edit {
        node: next_tree.focused(),
        graph: next_graph,
        tree: next_tree,
    })
}

/// Deletes `node`'s thing from the graph and drops every node projecting
/// it. Focus moves to the item above `node`.
///
/// No-op for the permanent root thing.
pub fn destroy(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    let thing = require(tree, node)?;
    if thing == ROOT_THING {
        debug!("event=tree_destroy module=editor status=skipped reason=root");
        return Ok(Edit::unchanged(graph, tree, node));
    }

    let mut former_children = graph.children(&thing);
    former_children.sort();
    former_children.dedup();

    let mut next_graph = graph.clone();
    next_graph.remove(&thing);

    let mut next_tree = tree.clone();
    let focus = previous_visible_item(tree, node);
    for instance in next_tree.instances(&thing) {
        if next_tree.exists(instance) {
            detach_instance(&mut next_tree, instance, &thing);
        }
    }
    for child in &former_children {
        refresh_other_parents_of(&next_graph, &mut next_tree, child);
    }
    if next_tree.exists(focus) {
        next_tree.focus(focus);
    } else {
        next_tree.unfocus();
    }

    debug!("event=tree_destroy module=editor status=ok node={node}");
    Ok(Edit {
        node: next_tree.focused(),
        graph: next_graph,
        tree: next_tree,
    })
}

/// Same as [`destroy`].
pub fn remove_thing(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Edit> {
    destroy(graph, tree, node)
}

fn detach_instance(tree: &mut Tree, instance: NodeRef, thing: &str) {
    let Some(source) = tree.source(instance) else {
        return;
    };
    let (owner, kind) = match source {
        NodeSource::Root => return,
        NodeSource::OpenedLink { parent } => {
            tree.set_opened_link_node(parent, thing, None);
            return;
        }
        NodeSource::Child { parent } => (parent, ListKind::Children),
        NodeSource::OtherParent { parent } => (parent, ListKind::OtherParents),
        NodeSource::Reference { parent } => (parent, ListKind::Backreferences),
    };
    match tree.list(owner, kind).iter().position(|n| *n == instance) {
        Some(index) => {
            tree.detach_from_list(owner, kind, index);
        }
        None => tree.release(instance),
    }
}

/// Swaps `node` for the existing thing `replacement` at the same position.
///
/// An empty item is destroyed; one with content is only disconnected.
///
/// # Errors
/// - `NoStructuralParent` when `node` is not a child node.
pub fn replace(graph: &Graph, tree: &Tree, node: NodeRef, replacement: &str) -> EditResult<Edit> {
    let thing = require(tree, node)?;
    let parent = tree
        .structural_parent(node)
        .ok_or(EditError::NoStructuralParent(node))?;
    let parent_thing = require(tree, parent)?;
    let index = connection_index(graph, tree, &parent_thing, node)
        .ok_or(EditError::NoStructuralParent(node))?;

    let vacated = if is_blank(graph.content(&thing)) {
        destroy(graph, tree, node)?
    } else {
        remove(graph, tree, node)?
    };
    if !vacated.tree.exists(parent) {
        return Ok(vacated);
    }
    let index = index.min(vacated.graph.child_connections(&parent_thing).len());
    insert_child(&vacated.graph, &vacated.tree, parent, replacement, index)
}

// Folding

pub fn toggle(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Tree> {
    require(tree, node)?;
    let mut next_tree = tree.clone();
    projection::toggle(graph, &mut next_tree, node);
    Ok(next_tree)
}

pub fn expand(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Tree> {
    require(tree, node)?;
    let mut next_tree = tree.clone();
    projection::expand(graph, &mut next_tree, node);
    Ok(next_tree)
}

pub fn toggle_link(graph: &Graph, tree: &Tree, node: NodeRef, link: &str) -> EditResult<Tree> {
    require(tree, node)?;
    let mut next_tree = tree.clone();
    projection::toggle_link(graph, &mut next_tree, node, link);
    Ok(next_tree)
}

pub fn toggle_backreferences(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Tree> {
    require(tree, node)?;
    let mut next_tree = tree.clone();
    projection::toggle_backreferences(graph, &mut next_tree, node);
    Ok(next_tree)
}

pub fn toggle_other_parents(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Tree> {
    require(tree, node)?;
    let mut next_tree = tree.clone();
    projection::toggle_other_parents(graph, &mut next_tree, node);
    Ok(next_tree)
}

/// Expands `node` and everything below it.
///
/// A thing may show up again at a deeper level, but expansion stops at the
/// first repeat along any single path.
pub fn unfold(graph: &Graph, tree: &Tree, node: NodeRef) -> EditResult<Tree> {
    require(tree, node)?;
    let mut next_tree = tree.clone();
    let mut path = Vec::new();
    unfold_from(graph, &mut next_tree, node, &mut path);
    Ok(next_tree)
}

fn unfold_from(graph: &Graph, tree: &mut Tree, node: NodeRef, path: &mut Vec<ThingId>) {
    let Some(thing) = tree.thing(node).map(str::to_string) else {
        return;
    };
    if path.contains(&thing) {
        return;
    }
    projection::expand(graph, tree, node);
    path.push(thing);
    for child in tree.children(node).to_vec() {
        unfold_from(graph, tree, child, path);
    }
    path.pop();
}

// Focus

/// Moves focus to the item shown above the focused one.
///
/// # Errors
/// - `NothingFocused` when no node has focus.
pub fn focus_up(tree: &Tree) -> EditResult<Tree> {
    let focused = tree.focused().ok_or(EditError::NothingFocused)?;
    let mut next_tree = tree.clone();
    next_tree.focus(previous_visible_item(tree, focused));
    Ok(next_tree)
}

/// Moves focus to the item shown below the focused one.
///
/// # Errors
/// - `NothingFocused` when no node has focus.
pub fn focus_down(tree: &Tree) -> EditResult<Tree> {
    let focused = tree.focused().ok_or(EditError::NothingFocused)?;
    let mut next_tree = tree.clone();
    next_tree.focus(next_visible_item(tree, focused));
    Ok(next_tree)
}
