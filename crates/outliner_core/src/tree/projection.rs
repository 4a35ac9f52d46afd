//! Tree projection: loading and refreshing tree nodes from the graph.
//!
//! # Responsibility
//! - Materialize child and side-list nodes lazily, on expand.
//! - Keep expanded lists in step with the graph using a bounded positional
//!   diff with a full-rebuild fallback.
//!
//! # Invariants
//! - Collapsed nodes are never refreshed; their lists may be stale.
//! - A thing with no children and no backreferences is always expanded.
//! - A list whose thing sequence already matches the graph keeps its nodes.
//!
//! # See also
//! - `tree::representation` for node storage.
//! - `service::editor` for the structural operations built on top.

use crate::model::content::is_single_link;
use crate::model::content::ThingId;
use crate::model::graph::{ConnectionId, Graph};
use crate::tree::representation::{ListKind, NodeRef, NodeSource, Tree};
use log::{debug, warn};

/// Items with at most this many other parents show them inline.
pub const INLINE_OTHER_PARENTS_MAX: usize = 2;
/// Backreference lists up to this length open automatically on expand.
pub const AUTO_EXPAND_BACKREFERENCES_MAX: usize = 3;

/// Returns whether `thing` is pinned open: no children, no backreferences.
pub fn should_always_be_expanded(graph: &Graph, thing: &str) -> bool {
    !graph.has_children(thing) && graph.backreferences(thing).is_empty()
}

/// Builds the tree the UI starts from: `thing` at the root, expanded, with
/// its other-parents and backreferences side-lists opened.
pub fn from_root(graph: &Graph, thing: &str) -> Tree {
    let mut tree = Tree::from_root(thing);
    let root = tree.root();
    expand(graph, &mut tree, root);
    for kind in [ListKind::OtherParents, ListKind::Backreferences] {
        if !tree.list_expanded(root, kind) {
            toggle_side_list(graph, &mut tree, root, kind);
        }
    }
    tree
}

/// Returns whether `node`'s other parents are shown inline rather than
/// behind their own fold.
pub fn shows_other_parents_inline(tree: &Tree, node: NodeRef) -> bool {
    tree.other_parents_children(node).len() <= INLINE_OTHER_PARENTS_MAX
}

/// Loads `thing` as a new unlisted node, pinning it open when it is a leaf.
pub(crate) fn load(
    graph: &Graph,
    tree: &mut Tree,
    thing: &str,
    source: NodeSource,
    connection: Option<ConnectionId>,
) -> NodeRef {
    let node = tree.load_thing(thing, source, connection);
    if should_always_be_expanded(graph, thing) {
        tree.mark_expanded(node, true);
    }
    node
}

/// Expands `node` unless it already is.
pub fn expand(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    if !tree.expanded(node) {
        toggle(graph, tree, node);
    }
}

/// Flips `node`'s expansion flag and brings its lists up to date.
///
/// Pinned-open leaves stay expanded. Expanding refreshes the children list;
/// the other-parents and backreferences lists are refreshed on every call,
/// and short backreference lists are opened automatically.
pub fn toggle(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    let Some(thing) = tree.thing(node).map(str::to_string) else {
        return;
    };

    if should_always_be_expanded(graph, &thing) {
        tree.mark_expanded(node, true);
        return;
    }

    let expanded = !tree.expanded(node);
    tree.mark_expanded(node, expanded);
    if expanded {
        refresh_children(graph, tree, node);
    }

    refresh_other_parents(graph, tree, node);
    refresh_backreferences(graph, tree, node);
    if tree.backreferences_children(node).len() <= AUTO_EXPAND_BACKREFERENCES_MAX
        && !tree.backreferences_expanded(node)
    {
        toggle_backreferences(graph, tree, node);
    }
}

pub fn toggle_backreferences(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    toggle_side_list(graph, tree, node, ListKind::Backreferences);
}

pub fn toggle_other_parents(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    toggle_side_list(graph, tree, node, ListKind::OtherParents);
}

fn toggle_side_list(graph: &Graph, tree: &mut Tree, node: NodeRef, kind: ListKind) {
    if !tree.exists(node) {
        warn!("event=toggle_side_list module=projection status=degraded reason=missing_node node={node}");
        return;
    }
    let expanded = !tree.list_expanded(node, kind);
    tree.mark_list_expanded(node, kind, expanded);
    if expanded {
        refresh_list(graph, tree, node, kind);
    }
}

/// Opens or closes the inline link from `node` to `link`.
///
/// Opening loads the linked thing under `node`, expands `node` and toggles
/// the new node open. Closing drops the opened node.
pub fn toggle_link(graph: &Graph, tree: &mut Tree, node: NodeRef, link: &str) {
    if tree.is_link_open(node, link) {
        tree.set_opened_link_node(node, link, None);
        return;
    }
    if !tree.exists(node) {
        warn!("event=toggle_link module=projection status=degraded reason=missing_node node={node}");
        return;
    }
    if !graph.exists(link) {
        warn!("event=toggle_link module=projection status=degraded reason=missing_thing node={node}");
        return;
    }

    let link_node = load(graph, tree, link, NodeSource::OpenedLink { parent: node }, None);
    tree.set_opened_link_node(node, link, Some(link_node));
    expand(graph, tree, node);
    toggle(graph, tree, link_node);
}

pub fn refresh_children(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    refresh_list(graph, tree, node, ListKind::Children);
}

pub fn refresh_other_parents(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    refresh_list(graph, tree, node, ListKind::OtherParents);
}

/// Refreshes `node`'s backreferences, then expands every reference whose
/// content is a single link.
///
/// A reference already projected higher up on the same path is left
/// collapsed, so mutually linking items do not expand forever.
pub fn refresh_backreferences(graph: &Graph, tree: &mut Tree, node: NodeRef) {
    refresh_list(graph, tree, node, ListKind::Backreferences);

    let references = tree.backreferences_children(node).to_vec();
    for reference in references {
        let Some(thing) = tree.thing(reference).map(str::to_string) else {
            continue;
        };
        if !is_single_link(graph.content(&thing)) {
            continue;
        }
        if tree.ancestor_things(reference).contains(&thing) {
            debug!("event=refresh_backreferences module=projection status=skipped reason=cycle node={reference}");
            continue;
        }
        expand(graph, tree, reference);
    }
}

/// Re-synchronizes every list of every node whose thing still exists.
///
/// Used after the graph was replaced wholesale, e.g. by a remote change.
pub fn refresh(graph: &Graph, tree: &mut Tree) {
    for node in tree.all_nodes() {
        if !tree.exists(node) {
            continue;
        }
        let exists = tree.thing(node).is_some_and(|thing| graph.exists(thing));
        if exists {
            refresh_children(graph, tree, node);
            refresh_backreferences(graph, tree, node);
            refresh_other_parents(graph, tree, node);
        }
    }
    debug!("event=tree_refresh module=projection status=ok nodes={}", tree.node_count());
}

/// Things the graph says `node`'s `kind` list should project, in order.
fn target_things(graph: &Graph, tree: &Tree, node: NodeRef, thing: &str, kind: ListKind) -> Vec<ThingId> {
    match kind {
        ListKind::Children => graph.children(thing),
        ListKind::Backreferences => graph.backreferences(thing),
        ListKind::OtherParents => {
            let parent_thing = tree
                .structural_parent(node)
                .and_then(|parent| tree.thing(parent));
            graph.other_parents(thing, parent_thing)
        }
    }
}

fn current_things(tree: &Tree, node: NodeRef, kind: ListKind) -> Vec<ThingId> {
    tree.list(node, kind)
        .iter()
        .filter_map(|n| tree.thing(*n))
        .map(str::to_string)
        .collect()
}

/// Brings one of `node`'s lists in line with the graph.
///
/// Policy, cheapest first: skip collapsed nodes; keep a list that already
/// matches; patch a single insertion or deletion in place; otherwise drop
/// every node in the list and load it again.
pub(crate) fn refresh_list(graph: &Graph, tree: &mut Tree, node: NodeRef, kind: ListKind) {
    let Some(thing) = tree.thing(node).map(str::to_string) else {
        return;
    };
    if !tree.expanded(node) {
        return;
    }

    let target = target_things(graph, tree, node, &thing, kind);
    let current = current_things(tree, node, kind);

    if target != current {
        let patched = if target.len() == current.len() + 1 {
            apply_single_insertion(graph, tree, node, &thing, kind, &target)
        } else if target.len() + 1 == current.len() {
            apply_single_deletion(tree, node, kind, &target, &current)
        } else {
            false
        };

        if !patched {
            rebuild_list(graph, tree, node, &thing, kind, &target);
        }
    }

    if kind == ListKind::Children {
        sync_connections(graph, tree, node, &thing);
    }
}

fn load_into(
    graph: &Graph,
    tree: &mut Tree,
    node: NodeRef,
    thing: &str,
    kind: ListKind,
    index: usize,
    child: &str,
) -> NodeRef {
    let connection = match kind {
        ListKind::Children => graph.child_connections(thing).get(index).cloned(),
        _ => None,
    };
    let loaded = load(graph, tree, child, kind.source(node), connection);
    tree.insert_into_list(node, kind, index, loaded);
    loaded
}

/// Inserts a freshly loaded node wherever the list diverges from `target`,
/// then truncates anything past `target`'s length.
///
/// Returns whether the list now matches `target`.
fn apply_single_insertion(
    graph: &Graph,
    tree: &mut Tree,
    node: NodeRef,
    thing: &str,
    kind: ListKind,
    target: &[ThingId],
) -> bool {
    for (index, expected) in target.iter().enumerate() {
        let matches = tree
            .list(node, kind)
            .get(index)
            .and_then(|n| tree.thing(*n))
            .is_some_and(|t| t == expected.as_str());
        if !matches {
            load_into(graph, tree, node, thing, kind, index, expected);
        }
    }
    tree.truncate_list(node, kind, target.len());
    current_things(tree, node, kind) == target
}

/// Drops the first node that diverges from `target`.
///
/// Returns whether that accounted for the whole difference; if not the
/// list is left for a rebuild.
fn apply_single_deletion(
    tree: &mut Tree,
    node: NodeRef,
    kind: ListKind,
    target: &[ThingId],
    current: &[ThingId],
) -> bool {
    let index = current
        .iter()
        .zip(target.iter())
        .position(|(have, want)| have != want)
        .unwrap_or(target.len());

    let mut remaining = current.to_vec();
    remaining.remove(index);
    if remaining != target {
        return false;
    }
    tree.detach_from_list(node, kind, index);
    true
}

fn rebuild_list(
    graph: &Graph,
    tree: &mut Tree,
    node: NodeRef,
    thing: &str,
    kind: ListKind,
    target: &[ThingId],
) {
    tree.clear_list(node, kind);
    for (index, child) in target.iter().enumerate() {
        load_into(graph, tree, node, thing, kind, index, child);
    }
    debug!("event=list_rebuild module=projection status=ok node={node} len={}", target.len());
}

/// Points each child node at the connection now at its position.
fn sync_connections(graph: &Graph, tree: &mut Tree, node: NodeRef, thing: &str) {
    let connections = graph.child_connections(thing).to_vec();
    let children = tree.children(node).to_vec();
    for (child, connection) in children.into_iter().zip(connections) {
        if tree.connection(child) != Some(connection.as_str()) {
            tree.set_connection(child, Some(connection));
        }
    }
}
