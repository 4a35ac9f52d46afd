//! Tree node storage for the graph-as-a-tree projection.
//!
//! # Responsibility
//! - Store projected nodes in an arena keyed by a per-tree numeric id.
//! - Track expansion flags, focus, side-lists and where each node came from.
//! - Maintain the thing -> live node index used for fan-out updates.
//!
//! # Invariants
//! - The root node has id 0 and is never released.
//! - Every live node other than the root sits in exactly one owning list,
//!   named by its `source`; a node detached from that list is released
//!   together with its whole subtree.
//! - Node ids are never handed out twice; a released id stays dead.
//! - `instances` lists exactly the live nodes projecting each thing.
//! - At most one node is focused, and the focused node is live.

use crate::model::content::ThingId;
use crate::model::graph::ConnectionId;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Reference to one node of one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: u32,
}

impl NodeRef {
    pub const fn new(id: u32) -> Self {
        Self { id }
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Where a node was loaded from, naming its owning node when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeSource {
    Root,
    Child { parent: NodeRef },
    OtherParent { parent: NodeRef },
    Reference { parent: NodeRef },
    OpenedLink { parent: NodeRef },
}

impl NodeSource {
    pub fn parent(&self) -> Option<NodeRef> {
        match self {
            Self::Root => None,
            Self::Child { parent }
            | Self::OtherParent { parent }
            | Self::Reference { parent }
            | Self::OpenedLink { parent } => Some(*parent),
        }
    }
}

/// Role a node currently plays in the tree, derived from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Root,
    Child,
    /// Inline "other parent" of its owning node.
    Parent,
    Reference,
    OpenedLink,
}

/// Display status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Collapsed,
    /// Expanded, with nothing loaded under it.
    Terminal,
    Expanded,
}

/// One of the ordered node lists hanging off a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Children,
    Backreferences,
    OtherParents,
}

impl ListKind {
    /// Source tag given to nodes loaded into this list under `parent`.
    pub fn source(self, parent: NodeRef) -> NodeSource {
        match self {
            Self::Children => NodeSource::Child { parent },
            Self::Backreferences => NodeSource::Reference { parent },
            Self::OtherParents => NodeSource::OtherParent { parent },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SideList {
    expanded: bool,
    nodes: Vec<NodeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    thing: ThingId,
    connection: Option<ConnectionId>,
    source: NodeSource,
    expanded: bool,
    children: Vec<NodeRef>,
    backreferences: SideList,
    other_parents: SideList,
    /// Opened inline links in opening order, keyed by linked thing.
    opened_links: Vec<(ThingId, NodeRef)>,
}

impl Node {
    fn new(thing: ThingId, source: NodeSource, connection: Option<ConnectionId>) -> Self {
        Self {
            thing,
            connection,
            source,
            expanded: false,
            children: Vec::new(),
            backreferences: SideList::default(),
            other_parents: SideList::default(),
            opened_links: Vec::new(),
        }
    }

    fn list(&self, kind: ListKind) -> &Vec<NodeRef> {
        match kind {
            ListKind::Children => &self.children,
            ListKind::Backreferences => &self.backreferences.nodes,
            ListKind::OtherParents => &self.other_parents.nodes,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<NodeRef> {
        match kind {
            ListKind::Children => &mut self.children,
            ListKind::Backreferences => &mut self.backreferences.nodes,
            ListKind::OtherParents => &mut self.other_parents.nodes,
        }
    }

    fn owned_nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.children
            .iter()
            .chain(self.backreferences.nodes.iter())
            .chain(self.other_parents.nodes.iter())
            .copied()
            .chain(self.opened_links.iter().map(|(_, node)| *node))
    }

    fn owns(&self, source: &NodeSource, child: NodeRef) -> bool {
        match source {
            NodeSource::Root => false,
            NodeSource::Child { .. } => self.children.contains(&child),
            NodeSource::OtherParent { .. } => self.other_parents.nodes.contains(&child),
            NodeSource::Reference { .. } => self.backreferences.nodes.contains(&child),
            NodeSource::OpenedLink { .. } => {
                self.opened_links.iter().any(|(_, node)| *node == child)
            }
        }
    }
}

/// A projection of the graph as an expandable tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    next_id: u32,
    root: NodeRef,
    nodes: BTreeMap<u32, Node>,
    focus: Option<NodeRef>,
    instances: BTreeMap<ThingId, BTreeSet<u32>>,
}

impl Tree {
    /// Creates a tree holding a single collapsed root node for `thing`.
    pub fn from_root(thing: impl Into<ThingId>) -> Self {
        let thing = thing.into();
        let root = NodeRef::new(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root.id, Node::new(thing.clone(), NodeSource::Root, None));
        let mut instances = BTreeMap::new();
        instances.insert(thing, BTreeSet::from([root.id]));
        Self {
            next_id: 1,
            root,
            nodes,
            focus: None,
            instances,
        }
    }

    fn node(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(&node.id)
    }

    fn node_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        let found = self.nodes.get_mut(&node.id);
        if found.is_none() {
            warn!("event=tree_update module=tree status=degraded reason=missing_node node={node}");
        }
        found
    }

    // Queries

    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn exists(&self, node: NodeRef) -> bool {
        self.nodes.contains_key(&node.id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns every live node in id order.
    pub fn all_nodes(&self) -> Vec<NodeRef> {
        self.nodes.keys().copied().map(NodeRef::new).collect()
    }

    /// Returns the thing projected by `node`.
    pub fn thing(&self, node: NodeRef) -> Option<&str> {
        match self.node(node) {
            Some(data) => Some(data.thing.as_str()),
            None => {
                warn!("event=node_thing module=tree status=degraded reason=missing_node node={node}");
                None
            }
        }
    }

    pub fn source(&self, node: NodeRef) -> Option<NodeSource> {
        self.node(node).map(|data| data.source)
    }

    /// Returns the connection a child node was loaded from.
    pub fn connection(&self, node: NodeRef) -> Option<&str> {
        self.node(node).and_then(|data| data.connection.as_deref())
    }

    pub fn expanded(&self, node: NodeRef) -> bool {
        match self.node(node) {
            Some(data) => data.expanded,
            None => {
                warn!("event=node_expanded module=tree status=degraded reason=missing_node node={node}");
                false
            }
        }
    }

    pub fn focused(&self) -> Option<NodeRef> {
        self.focus
    }

    pub fn has_focus(&self, node: NodeRef) -> bool {
        self.focus == Some(node)
    }

    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        self.list(node, ListKind::Children)
    }

    /// Returns one of `node`'s ordered lists.
    pub fn list(&self, node: NodeRef, kind: ListKind) -> &[NodeRef] {
        match self.node(node) {
            Some(data) => data.list(kind),
            None => {
                warn!("event=node_list module=tree status=degraded reason=missing_node node={node}");
                &[]
            }
        }
    }

    /// Returns the fold flag of one of `node`'s lists.
    ///
    /// For [`ListKind::Children`] this is the node's own expansion flag.
    pub fn list_expanded(&self, node: NodeRef, kind: ListKind) -> bool {
        match (self.node(node), kind) {
            (None, _) => false,
            (Some(data), ListKind::Children) => data.expanded,
            (Some(data), ListKind::Backreferences) => data.backreferences.expanded,
            (Some(data), ListKind::OtherParents) => data.other_parents.expanded,
        }
    }

    pub fn backreferences_expanded(&self, node: NodeRef) -> bool {
        self.list_expanded(node, ListKind::Backreferences)
    }

    pub fn backreferences_children(&self, node: NodeRef) -> &[NodeRef] {
        self.list(node, ListKind::Backreferences)
    }

    pub fn other_parents_expanded(&self, node: NodeRef) -> bool {
        self.list_expanded(node, ListKind::OtherParents)
    }

    pub fn other_parents_children(&self, node: NodeRef) -> &[NodeRef] {
        self.list(node, ListKind::OtherParents)
    }

    pub fn opened_link_node(&self, node: NodeRef, link: &str) -> Option<NodeRef> {
        self.node(node).and_then(|data| {
            data.opened_links
                .iter()
                .find(|(thing, _)| thing == link)
                .map(|(_, opened)| *opened)
        })
    }

    pub fn is_link_open(&self, node: NodeRef, link: &str) -> bool {
        self.opened_link_node(node, link).is_some()
    }

    /// Returns opened link nodes in opening order.
    pub fn opened_links_children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.node(node)
            .map(|data| data.opened_links.iter().map(|(_, n)| *n).collect())
            .unwrap_or_default()
    }

    /// Returns every live node projecting `thing`, in id order.
    pub fn instances(&self, thing: &str) -> Vec<NodeRef> {
        self.instances
            .get(thing)
            .map(|ids| ids.iter().copied().map(NodeRef::new).collect())
            .unwrap_or_default()
    }

    /// Returns every live node projecting the same thing as `node`.
    pub fn similar_nodes(&self, node: NodeRef) -> Vec<NodeRef> {
        match self.node(node) {
            Some(data) => self.instances(&data.thing),
            None => Vec::new(),
        }
    }

    /// Derives `node`'s role by following sources up to the root.
    ///
    /// Returns `None` for released nodes and for nodes (or ancestors) that
    /// are no longer listed by the owner their source names.
    pub fn kind(&self, node: NodeRef) -> Option<NodeKind> {
        let data = self.node(node)?;
        let kind = match data.source {
            NodeSource::Root => NodeKind::Root,
            NodeSource::Child { .. } => NodeKind::Child,
            NodeSource::OtherParent { .. } => NodeKind::Parent,
            NodeSource::Reference { .. } => NodeKind::Reference,
            NodeSource::OpenedLink { .. } => NodeKind::OpenedLink,
        };

        let mut current = node;
        for _ in 0..=self.nodes.len() {
            let data = self.node(current)?;
            match data.source.parent() {
                None => return (current == self.root).then_some(kind),
                Some(parent) => {
                    if !self.node(parent)?.owns(&data.source, current) {
                        return None;
                    }
                    current = parent;
                }
            }
        }
        None
    }

    /// Returns the node whose children list holds `node`.
    pub fn structural_parent(&self, node: NodeRef) -> Option<NodeRef> {
        match self.node(node)?.source {
            NodeSource::Child { parent } if self.node(parent)?.children.contains(&node) => {
                Some(parent)
            }
            _ => None,
        }
    }

    /// Returns `node`'s position in its structural parent's children.
    pub fn index_in_parent(&self, node: NodeRef) -> Option<usize> {
        let parent = self.structural_parent(node)?;
        self.children(parent).iter().position(|n| *n == node)
    }

    /// Returns whether `ancestor` is `node` or owns it through any list.
    pub fn is_ancestor_or_self(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.source(n).and_then(|source| source.parent());
        }
        false
    }

    /// Returns the things projected by `node`'s owners, nearest first.
    pub fn ancestor_things(&self, node: NodeRef) -> Vec<ThingId> {
        let mut result = Vec::new();
        let mut current = self.source(node).and_then(|source| source.parent());
        while let Some(n) = current {
            if result.len() > self.nodes.len() {
                break;
            }
            match self.node(n) {
                Some(data) => {
                    result.push(data.thing.clone());
                    current = data.source.parent();
                }
                None => break,
            }
        }
        result
    }

    pub fn status(&self, node: NodeRef) -> NodeStatus {
        match self.node(node) {
            None => NodeStatus::Collapsed,
            Some(data) if !data.expanded => NodeStatus::Collapsed,
            Some(data) if data.owned_nodes().next().is_none() => NodeStatus::Terminal,
            Some(_) => NodeStatus::Expanded,
        }
    }

    // Focus

    /// Focuses `node`; focusing a released node clears focus instead.
    pub fn focus(&mut self, node: NodeRef) {
        if self.exists(node) {
            self.focus = Some(node);
        } else {
            warn!("event=tree_focus module=tree status=degraded reason=missing_node node={node}");
            self.focus = None;
        }
    }

    pub fn unfocus(&mut self) {
        self.focus = None;
    }

    // Mutations used by the projection and the editor.

    pub(crate) fn mark_expanded(&mut self, node: NodeRef, expanded: bool) {
        if let Some(data) = self.node_mut(node) {
            data.expanded = expanded;
        }
    }

    pub(crate) fn mark_list_expanded(&mut self, node: NodeRef, kind: ListKind, expanded: bool) {
        if let Some(data) = self.node_mut(node) {
            match kind {
                ListKind::Children => data.expanded = expanded,
                ListKind::Backreferences => data.backreferences.expanded = expanded,
                ListKind::OtherParents => data.other_parents.expanded = expanded,
            }
        }
    }

    pub(crate) fn set_connection(&mut self, node: NodeRef, connection: Option<ConnectionId>) {
        if let Some(data) = self.node_mut(node) {
            data.connection = connection;
        }
    }

    /// Adds a fresh collapsed node to the arena without listing it anywhere.
    pub(crate) fn load_thing(
        &mut self,
        thing: &str,
        source: NodeSource,
        connection: Option<ConnectionId>,
    ) -> NodeRef {
        let node = NodeRef::new(self.next_id);
        self.next_id += 1;
        self.insert_node(node, thing, source, connection);
        node
    }

    fn insert_node(
        &mut self,
        node: NodeRef,
        thing: &str,
        source: NodeSource,
        connection: Option<ConnectionId>,
    ) {
        self.nodes
            .insert(node.id, Node::new(thing.to_string(), source, connection));
        self.instances
            .entry(thing.to_string())
            .or_default()
            .insert(node.id);
    }

    pub(crate) fn insert_into_list(
        &mut self,
        owner: NodeRef,
        kind: ListKind,
        index: usize,
        node: NodeRef,
    ) {
        if let Some(data) = self.node_mut(owner) {
            let list = data.list_mut(kind);
            let index = index.min(list.len());
            list.insert(index, node);
        }
    }

    pub(crate) fn push_to_list(&mut self, owner: NodeRef, kind: ListKind, node: NodeRef) {
        if let Some(data) = self.node_mut(owner) {
            data.list_mut(kind).push(node);
        }
    }

    /// Splices the node at `index` out of `owner`'s list and keeps it live.
    ///
    /// The caller must either list it again or [`Tree::release`] it.
    pub(crate) fn take_from_list(
        &mut self,
        owner: NodeRef,
        kind: ListKind,
        index: usize,
    ) -> Option<NodeRef> {
        let list = self.node_mut(owner)?.list_mut(kind);
        (index < list.len()).then(|| list.remove(index))
    }

    pub(crate) fn set_source(&mut self, node: NodeRef, source: NodeSource) {
        if let Some(data) = self.node_mut(node) {
            data.source = source;
        }
    }

    /// Splices the node at `index` out of `owner`'s list and releases it.
    pub(crate) fn detach_from_list(
        &mut self,
        owner: NodeRef,
        kind: ListKind,
        index: usize,
    ) -> Option<NodeRef> {
        let data = self.node_mut(owner)?;
        let list = data.list_mut(kind);
        if index >= list.len() {
            return None;
        }
        let removed = list.remove(index);
        self.release(removed);
        Some(removed)
    }

    /// Drops every entry of `owner`'s list past `len`, releasing them.
    pub(crate) fn truncate_list(&mut self, owner: NodeRef, kind: ListKind, len: usize) {
        let Some(data) = self.node_mut(owner) else {
            return;
        };
        let list = data.list_mut(kind);
        if list.len() <= len {
            return;
        }
        let removed = list.split_off(len);
        for node in removed {
            self.release(node);
        }
    }

    /// Empties `owner`'s list, releasing every entry.
    pub(crate) fn clear_list(&mut self, owner: NodeRef, kind: ListKind) {
        self.truncate_list(owner, kind, 0);
    }

    /// Records `link_node` as the opened node for `link`, or closes the link
    /// (releasing its node) when `link_node` is `None`.
    pub(crate) fn set_opened_link_node(
        &mut self,
        owner: NodeRef,
        link: &str,
        link_node: Option<NodeRef>,
    ) {
        let Some(data) = self.node_mut(owner) else {
            return;
        };
        let previous = data
            .opened_links
            .iter()
            .position(|(thing, _)| thing == link)
            .map(|index| data.opened_links.remove(index).1);
        if let Some(node) = link_node {
            data.opened_links.push((link.to_string(), node));
        }
        if let Some(previous) = previous {
            if Some(previous) != link_node {
                self.release(previous);
            }
        }
    }

    /// Removes `node` and everything it owns from the arena.
    pub(crate) fn release(&mut self, node: NodeRef) {
        if node == self.root {
            warn!("event=tree_release module=tree status=skipped reason=root");
            return;
        }
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let Some(data) = self.nodes.remove(&current.id) else {
                continue;
            };
            if let Some(ids) = self.instances.get_mut(&data.thing) {
                ids.remove(&current.id);
                if ids.is_empty() {
                    self.instances.remove(&data.thing);
                }
            }
            if self.focus == Some(current) {
                self.focus = None;
            }
            pending.extend(data.owned_nodes().filter(|n| *n != self.root));
        }
    }
}
