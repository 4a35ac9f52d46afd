//! Graph store: things, ordered connections and derived links.
//!
//! # Responsibility
//! - Own the authoritative thing/connection/content records.
//! - Provide create/edit/connect/disconnect/remove mutations and the query
//!   surface consumed by the tree projection and outer collaborators.
//!
//! # Invariants
//! - Every connection id listed in a parent's `children` is also listed in
//!   the child's `parents`, and has a connection record naming both ends.
//! - Both endpoints of every connection exist.
//! - Root thing [`ROOT_THING`] always exists and is never forgotten.
//! - Queries on missing things log a warning and return empty values.

use crate::model::content::{links_in_content, Content, Segment, ThingId};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Id of the permanent root thing.
pub const ROOT_THING: &str = "0";

/// Stable identifier of one parent-to-child connection.
pub type ConnectionId = String;

/// Result type used by graph store mutations.
pub type GraphResult<T> = Result<T, GraphError>;

static THING_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid thing id regex"));

/// Errors from graph store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Target thing does not exist.
    ThingNotFound(ThingId),
    /// A caller-supplied id is already taken.
    DuplicateThing(ThingId),
    /// A caller-supplied thing or connection id does not match the id grammar.
    InvalidThingId(String),
    /// Child position is outside the parent's child list.
    ChildIndexOutOfRange {
        parent: ThingId,
        index: usize,
        len: usize,
    },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThingNotFound(id) => write!(f, "thing not found: {id}"),
            Self::DuplicateThing(id) => write!(f, "thing already exists: {id}"),
            Self::InvalidThingId(id) => write!(f, "invalid thing id: `{id}`"),
            Self::ChildIndexOutOfRange { parent, index, len } => write!(
                f,
                "child index {index} out of range for thing {parent} with {len} children"
            ),
        }
    }
}

impl Error for GraphError {}

/// Stored record of one thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingRecord {
    pub content: Content,
    /// Outgoing connections in display order.
    pub children: Vec<ConnectionId>,
    /// Incoming connections, most recently added first.
    pub parents: Vec<ConnectionId>,
}

/// Stored record of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub parent: ThingId,
    pub child: ThingId,
}

/// The thing graph.
///
/// Mutations take `&mut self`; callers that need value semantics clone the
/// graph first (the structural editor does this for every operation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    things: BTreeMap<ThingId, ThingRecord>,
    connections: BTreeMap<ConnectionId, ConnectionRecord>,
    /// Outgoing links per thing, derived from content on every edit.
    links: BTreeMap<ThingId, Vec<ThingId>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns whether `id` is acceptable as a caller-supplied thing or connection id.
pub fn is_valid_thing_id(id: &str) -> bool {
    THING_ID_RE.is_match(id)
}

impl Graph {
    /// Creates a graph holding only the root thing with empty content.
    pub fn new() -> Self {
        let mut things = BTreeMap::new();
        things.insert(ROOT_THING.to_string(), ThingRecord::default());
        Self {
            things,
            connections: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    // Mutations

    /// Inserts a thing with empty content and no connections.
    ///
    /// # Errors
    /// - `InvalidThingId` when `custom_id` does not match the id grammar.
    /// - `DuplicateThing` when `custom_id` is already taken.
    pub fn create(&mut self, custom_id: Option<&str>) -> GraphResult<ThingId> {
        let id = match custom_id {
            Some(id) => {
                if !is_valid_thing_id(id) {
                    return Err(GraphError::InvalidThingId(id.to_string()));
                }
                if self.things.contains_key(id) {
                    return Err(GraphError::DuplicateThing(id.to_string()));
                }
                id.to_string()
            }
            None => loop {
                let candidate = generate_id();
                if !self.things.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        self.things.insert(id.clone(), ThingRecord::default());
        debug!("event=thing_create module=graph status=ok thing={id}");
        Ok(id)
    }

    /// Replaces a thing's content wholesale and re-derives its links.
    ///
    /// Setting content on a missing thing creates it, with a warning.
    pub fn set_content(&mut self, thing: &str, content: Content) {
        if !self.things.contains_key(thing) {
            warn!("event=set_content module=graph status=degraded reason=missing_thing thing={thing}");
        }
        let links = links_in_content(&content);
        if links.is_empty() {
            self.links.remove(thing);
        } else {
            self.links.insert(thing.to_string(), links);
        }
        self.things.entry(thing.to_string()).or_default().content = content;
    }

    /// Inserts a connection at `index` among `parent`'s children.
    ///
    /// A missing `child` is created first, so cyclic or forward-referencing
    /// structures can be described parent-first.
    ///
    /// # Errors
    /// - `ThingNotFound` when `parent` does not exist.
    /// - `ChildIndexOutOfRange` when `index` is past the end of the list.
    /// - `InvalidThingId`/`DuplicateThing` for a bad `custom_connection_id`.
    pub fn insert_child(
        &mut self,
        parent: &str,
        child: &str,
        index: usize,
        custom_connection_id: Option<&str>,
    ) -> GraphResult<ConnectionId> {
        let len = match self.things.get(parent) {
            Some(record) => record.children.len(),
            None => return Err(GraphError::ThingNotFound(parent.to_string())),
        };
        if index > len {
            return Err(GraphError::ChildIndexOutOfRange {
                parent: parent.to_string(),
                index,
                len,
            });
        }

        let connection_id = match custom_connection_id {
            Some(id) => {
                if !is_valid_thing_id(id) {
                    return Err(GraphError::InvalidThingId(id.to_string()));
                }
                if self.connections.contains_key(id) {
                    return Err(GraphError::DuplicateThing(id.to_string()));
                }
                id.to_string()
            }
            None => loop {
                let candidate = format!("c.{}", generate_id());
                if !self.connections.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        if !self.things.contains_key(child) {
            self.things.insert(child.to_string(), ThingRecord::default());
        }

        self.connections.insert(
            connection_id.clone(),
            ConnectionRecord {
                parent: parent.to_string(),
                child: child.to_string(),
            },
        );
        if let Some(record) = self.things.get_mut(child) {
            record.parents.insert(0, connection_id.clone());
        }
        if let Some(record) = self.things.get_mut(parent) {
            record.children.insert(index, connection_id.clone());
        }

        Ok(connection_id)
    }

    /// Appends a connection at the end of `parent`'s children.
    pub fn add_child(
        &mut self,
        parent: &str,
        child: &str,
        custom_connection_id: Option<&str>,
    ) -> GraphResult<ConnectionId> {
        let index = self.child_connections(parent).len();
        self.insert_child(parent, child, index, custom_connection_id)
    }

    /// Removes the connection at `index` among `parent`'s children from both
    /// endpoints, then deletes the connection record.
    ///
    /// `index` counts raw connection ids (see [`Graph::child_connections`]).
    /// An id whose record or child is gone is still dropped from the list.
    ///
    /// # Errors
    /// - `ThingNotFound` when `parent` does not exist.
    /// - `ChildIndexOutOfRange` when `index` is past the end of the list.
    pub fn remove_child(&mut self, parent: &str, index: usize) -> GraphResult<()> {
        let connection_id = {
            let record = self
                .things
                .get(parent)
                .ok_or_else(|| GraphError::ThingNotFound(parent.to_string()))?;
            record
                .children
                .get(index)
                .cloned()
                .ok_or(GraphError::ChildIndexOutOfRange {
                    parent: parent.to_string(),
                    index,
                    len: record.children.len(),
                })?
        };

        let child = self.connection_child(&connection_id).map(str::to_string);
        match child.as_deref() {
            None => warn!(
                "event=remove_child module=graph status=degraded reason=dangling_connection parent={parent} index={index}"
            ),
            Some(child) if !self.things.contains_key(child) => warn!(
                "event=remove_child module=graph status=degraded reason=missing_child parent={parent} index={index}"
            ),
            Some(_) => {}
        }

        if let Some(record) = self.things.get_mut(parent) {
            record.children.remove(index);
        }
        if let Some(record) = child.and_then(|child| self.things.get_mut(&child)) {
            record.parents.retain(|id| *id != connection_id);
        }
        self.connections.remove(&connection_id);
        Ok(())
    }

    /// Detaches `thing` from every parent and child, then forgets it.
    ///
    /// No-op for the root thing and for things that do not exist.
    pub fn remove(&mut self, thing: &str) {
        if thing == ROOT_THING {
            debug!("event=thing_remove module=graph status=skipped reason=root");
            return;
        }
        if !self.exists(thing) {
            warn!("event=thing_remove module=graph status=degraded reason=missing_thing thing={thing}");
            return;
        }

        let mut parents = self.parents(thing);
        parents.dedup();
        for parent in parents {
            while let Some(index) = self.child_index(&parent, thing) {
                if self.remove_child(&parent, index).is_err() {
                    break;
                }
            }
        }

        while self.has_children(thing) {
            if self.remove_child(thing, 0).is_err() {
                break;
            }
        }

        self.forget(thing);
        debug!("event=thing_remove module=graph status=ok thing={thing}");
    }

    /// Position in `parent`'s raw connection list of the first connection
    /// leading to `child`.
    fn child_index(&self, parent: &str, child: &str) -> Option<usize> {
        self.things.get(parent).and_then(|record| {
            record
                .children
                .iter()
                .position(|id| self.connection_child(id) == Some(child))
        })
    }

    fn forget(&mut self, thing: &str) {
        if thing == ROOT_THING {
            return;
        }
        self.things.remove(thing);
        self.links.remove(thing);
    }

    /// Records a named connection while loading a snapshot.
    ///
    /// Both endpoints are created on demand; a connection id already listed
    /// on either end is not listed twice.
    pub(crate) fn attach_connection(&mut self, parent: &str, connection_id: &str, child: &str) {
        self.connections.insert(
            connection_id.to_string(),
            ConnectionRecord {
                parent: parent.to_string(),
                child: child.to_string(),
            },
        );

        let child_record = self.things.entry(child.to_string()).or_default();
        if !child_record.parents.iter().any(|id| id == connection_id) {
            child_record.parents.push(connection_id.to_string());
        }
        let parent_record = self.things.entry(parent.to_string()).or_default();
        if !parent_record.children.iter().any(|id| id == connection_id) {
            parent_record.children.push(connection_id.to_string());
        }
    }

    // Queries

    pub fn exists(&self, thing: &str) -> bool {
        self.things.contains_key(thing)
    }

    /// Returns every thing id in ascending order.
    pub fn all_things(&self) -> Vec<ThingId> {
        self.things.keys().cloned().collect()
    }

    pub fn thing_count(&self) -> usize {
        self.things.len()
    }

    pub fn content(&self, thing: &str) -> &[Segment] {
        match self.things.get(thing) {
            Some(record) => &record.content,
            None => {
                warn!("event=content module=graph status=degraded reason=missing_thing thing={thing}");
                &[]
            }
        }
    }

    /// Returns `thing`'s outgoing connection ids in display order.
    pub fn child_connections(&self, thing: &str) -> &[ConnectionId] {
        match self.things.get(thing) {
            Some(record) => &record.children,
            None => {
                warn!("event=children module=graph status=degraded reason=missing_thing thing={thing}");
                &[]
            }
        }
    }

    pub fn connection_parent(&self, connection: &str) -> Option<&str> {
        self.connections
            .get(connection)
            .map(|record| record.parent.as_str())
    }

    pub fn connection_child(&self, connection: &str) -> Option<&str> {
        self.connections
            .get(connection)
            .map(|record| record.child.as_str())
    }

    /// Returns `thing`'s children in display order, duplicates included.
    pub fn children(&self, thing: &str) -> Vec<ThingId> {
        self.things
            .get(thing)
            .map(|record| {
                record
                    .children
                    .iter()
                    .filter_map(|id| self.connection_child(id))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `thing`'s parents, most recently connected first.
    pub fn parents(&self, thing: &str) -> Vec<ThingId> {
        self.things
            .get(thing)
            .map(|record| {
                record
                    .parents
                    .iter()
                    .filter_map(|id| self.connection_parent(id))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `thing`'s parents other than `excluding`.
    pub fn other_parents(&self, thing: &str, excluding: Option<&str>) -> Vec<ThingId> {
        self.parents(thing)
            .into_iter()
            .filter(|parent| Some(parent.as_str()) != excluding)
            .collect()
    }

    pub fn has_children(&self, thing: &str) -> bool {
        self.things
            .get(thing)
            .map(|record| !record.children.is_empty())
            .unwrap_or(false)
    }

    pub fn has_children_or_references(&self, thing: &str) -> bool {
        self.has_children(thing) || !self.backreferences(thing).is_empty()
    }

    /// Returns the things linked from `thing`'s content, each once.
    pub fn references(&self, thing: &str) -> Vec<ThingId> {
        self.links.get(thing).cloned().unwrap_or_default()
    }

    /// Returns the things whose content links to `thing`, in id order.
    ///
    /// Full scan over the derived link lists.
    pub fn backreferences(&self, thing: &str) -> Vec<ThingId> {
        self.links
            .iter()
            .filter(|(source, targets)| {
                self.things.contains_key(source.as_str()) && targets.iter().any(|t| t == thing)
            })
            .map(|(source, _)| source.clone())
            .collect()
    }

    pub(crate) fn thing_record(&self, thing: &str) -> Option<&ThingRecord> {
        self.things.get(thing)
    }

    pub(crate) fn connection_record(&self, connection: &str) -> Option<&ConnectionRecord> {
        self.connections.get(connection)
    }
}

fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
