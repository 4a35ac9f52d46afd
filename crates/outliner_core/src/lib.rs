//! Core engine for graph-backed outline notes.
//! Things form a graph; the user edits it through an expandable tree.

pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod sync;
pub mod tree;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::content::{Content, Segment, ThingId};
pub use model::graph::{ConnectionId, Graph, GraphError, GraphResult, ROOT_THING};
pub use search::text::{content_text, preview_text, search, search_items, SearchItem, SearchQuery};
pub use service::editor::{Destination, Edit, EditError, EditResult};
pub use service::history::UndoStack;
pub use service::orphans::orphans;
pub use sync::diff::{diff, effects, Diff, Effects};
pub use sync::snapshot::{
    decode, encode, from_json, load_snapshot, save_snapshot, to_json, FullState, SnapshotError,
    SnapshotResult, WELCOME_TEXT,
};
pub use tree::projection::{from_root, refresh};
pub use tree::representation::{NodeKind, NodeRef, NodeSource, NodeStatus, Tree};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
