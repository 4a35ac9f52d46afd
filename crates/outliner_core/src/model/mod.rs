//! Graph data model for outline notes.
//!
//! # Responsibility
//! - Define the thing/connection/content records every projection reads.
//! - Keep parent and child sides of every connection synchronized.
//!
//! # Invariants
//! - Things are identified by stable string ids; `"0"` is the permanent root.
//! - Links are derived from content, never stored as edges.

pub mod content;
pub mod graph;
