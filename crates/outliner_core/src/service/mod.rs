//! Use-case layer over the graph and its tree projection.
//!
//! # Responsibility
//! - Structural editing with instance fan-out (`editor`).
//! - Undo snapshots (`history`) and orphan detection (`orphans`).
//!
//! # Invariants
//! - Services never hand out partially applied state.

pub mod editor;
pub mod history;
pub mod orphans;
