//! Text projection consumed by search and popups.

pub mod text;
