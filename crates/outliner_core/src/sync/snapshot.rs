//! Full-state transcoder between the graph and its wire/file form.
//!
//! # Responsibility
//! - Encode a graph as a flat list of things with named child connections.
//! - Decode that list back, tolerating forward references and repeated
//!   connection names.
//! - Read and write snapshot files as JSON.
//!
//! # Invariants
//! - Decoding never yields a graph without the root thing.
//! - Every id in a decoded snapshot matches the thing-id grammar.

use crate::model::content::{Content, Segment, ThingId};
use crate::model::graph::{is_valid_thing_id, ConnectionId, Graph, GraphError, ROOT_THING};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

/// Result type used by snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors from snapshot encoding, decoding and file access.
#[derive(Debug)]
pub enum SnapshotError {
    /// Reading or writing the snapshot file failed.
    Io(std::io::Error),
    /// Snapshot text is not valid full-state JSON.
    Json(serde_json::Error),
    /// A thing or connection id does not match the id grammar.
    InvalidThingId(String),
    /// Graph store rejected the decoded data.
    Graph(GraphError),
    /// A connection name is listed under two different parent/child pairs.
    ConnectionConflict {
        connection: ConnectionId,
        parent: ThingId,
        child: ThingId,
    },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "snapshot io error: {err}"),
            Self::Json(err) => write!(f, "snapshot json error: {err}"),
            Self::InvalidThingId(id) => write!(f, "invalid id in snapshot: `{id}`"),
            Self::Graph(err) => write!(f, "{err}"),
            Self::ConnectionConflict {
                connection,
                parent,
                child,
            } => write!(
                f,
                "connection `{connection}` from {parent} to {child} is already attached elsewhere"
            ),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Graph(err) => Some(err),
            Self::InvalidThingId(_) | Self::ConnectionConflict { .. } => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<GraphError> for SnapshotError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

/// Whole-graph payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullState {
    pub things: Vec<FullStateThing>,
}

/// One thing with its content and ordered child connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullStateThing {
    pub name: ThingId,
    pub content: Content,
    pub children: Vec<FullStateChild>,
}

/// One named child connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullStateChild {
    pub name: ConnectionId,
    pub child: ThingId,
}

/// Encodes every thing of `graph`, in thing-id order.
pub fn encode(graph: &Graph) -> FullState {
    let things = graph
        .all_things()
        .into_iter()
        .map(|thing| FullStateThing {
            content: graph.content(&thing).to_vec(),
            children: graph
                .child_connections(&thing)
                .iter()
                .filter_map(|connection| {
                    graph.connection_child(connection).map(|child| FullStateChild {
                        name: connection.clone(),
                        child: child.to_string(),
                    })
                })
                .collect(),
            name: thing,
        })
        .collect();
    FullState { things }
}

fn ensure_valid_id(id: &str) -> SnapshotResult<()> {
    if is_valid_thing_id(id) {
        Ok(())
    } else {
        Err(SnapshotError::InvalidThingId(id.to_string()))
    }
}

/// Content given to the root when a snapshot holds no things at all.
pub const WELCOME_TEXT: &str = "Welcome";

/// Rebuilds a graph from `state`.
///
/// An empty thing list yields a graph holding only the root, whose content
/// is [`WELCOME_TEXT`]. A non-empty list that omits the root leaves the
/// root empty. Children may be named before they are described; a
/// connection name listed twice for the same parent and child is attached
/// once.
///
/// # Errors
/// - `InvalidThingId` when any thing, child or connection id is malformed.
/// - `ConnectionConflict` when a connection name is reused for another
///   parent or another child.
pub fn decode(state: &FullState) -> SnapshotResult<Graph> {
    let mut graph = Graph::new();
    if state.things.is_empty() {
        graph.set_content(ROOT_THING, vec![Segment::text(WELCOME_TEXT)]);
        return Ok(graph);
    }
    for thing in &state.things {
        ensure_valid_id(&thing.name)?;
        if !graph.exists(&thing.name) {
            graph.create(Some(&thing.name))?;
        }
        graph.set_content(&thing.name, thing.content.clone());
        for connection in &thing.children {
            ensure_valid_id(&connection.name)?;
            ensure_valid_id(&connection.child)?;
            if let Some(existing) = graph.connection_record(&connection.name) {
                if existing.parent != thing.name || existing.child != connection.child {
                    warn!(
                        "event=snapshot_decode module=sync status=error reason=connection_conflict connection={}",
                        connection.name
                    );
                    return Err(SnapshotError::ConnectionConflict {
                        connection: connection.name.clone(),
                        parent: thing.name.clone(),
                        child: connection.child.clone(),
                    });
                }
            }
            graph.attach_connection(&thing.name, &connection.name, &connection.child);
        }
    }
    Ok(graph)
}

pub fn to_json(graph: &Graph) -> SnapshotResult<String> {
    Ok(serde_json::to_string_pretty(&encode(graph))?)
}

pub fn from_json(text: &str) -> SnapshotResult<Graph> {
    let state: FullState = serde_json::from_str(text)?;
    decode(&state)
}

/// Writes `graph` to `path` as pretty JSON.
pub fn save_snapshot(graph: &Graph, path: impl AsRef<Path>) -> SnapshotResult<()> {
    info!("event=snapshot_save module=sync status=start things={}", graph.thing_count());
    let text = to_json(graph)?;
    match fs::write(path.as_ref(), text) {
        Ok(()) => {
            info!("event=snapshot_save module=sync status=ok");
            Ok(())
        }
        Err(err) => {
            error!(
                "event=snapshot_save module=sync status=error error_kind={:?}",
                err.kind()
            );
            Err(err.into())
        }
    }
}

/// Reads a graph previously written by [`save_snapshot`].
pub fn load_snapshot(path: impl AsRef<Path>) -> SnapshotResult<Graph> {
    info!("event=snapshot_load module=sync status=start");
    let text = match fs::read_to_string(path.as_ref()) {
        Ok(text) => text,
        Err(err) => {
            error!(
                "event=snapshot_load module=sync status=error error_kind={:?}",
                err.kind()
            );
            return Err(err.into());
        }
    };
    let graph = from_json(&text)?;
    info!("event=snapshot_load module=sync status=ok things={}", graph.thing_count());
    Ok(graph)
}
