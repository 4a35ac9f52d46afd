//! Graph-as-a-tree projection.
//!
//! # Responsibility
//! - Store projected nodes (`representation`).
//! - Load and refresh them from the graph (`projection`).
//! - Walk the visible outline (`navigation`).
//!
//! # Invariants
//! - One thing may be projected by many live nodes at once.
//! - Node ids are scoped to one tree.

pub mod navigation;
pub mod projection;
pub mod representation;
