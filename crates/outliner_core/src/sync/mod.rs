//! Whole-state synchronization helpers.
//!
//! # Responsibility
//! - Diff graph snapshots into change sets (`diff`).
//! - Transcode full state to and from JSON payloads and files (`snapshot`).
//!
//! # Invariants
//! - No network or merge logic lives here; callers reconcile whole states.

pub mod diff;
pub mod snapshot;
