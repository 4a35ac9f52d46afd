//! Flattened text projection of thing content.
//!
//! # Responsibility
//! - Resolve link segments to the linked thing's own text.
//! - Provide per-thing search items and a simple linear matcher for the
//!   find popup.
//!
//! # Invariants
//! - Link resolution stops at the first repeat along a path (`...`).
//! - Links to missing things render as `[id]`.
//! - Output ordering is deterministic by thing id.

use crate::model::content::{Segment, ThingId};
use crate::model::graph::Graph;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Marker emitted where a link would recurse into itself.
pub const CYCLE_MARKER: &str = "...";

/// Returns `thing`'s content as plain text, with links expanded.
pub fn content_text(graph: &Graph, thing: &str) -> String {
    let mut path = Vec::new();
    let mut result = String::new();
    append_text(graph, thing, &mut path, &mut result);
    result
}

fn append_text(graph: &Graph, thing: &str, path: &mut Vec<ThingId>, out: &mut String) {
    if path.iter().any(|seen| seen == thing) {
        out.push_str(CYCLE_MARKER);
        return;
    }

    path.push(thing.to_string());
    for segment in graph.content(thing) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Link { link } if graph.exists(link) => append_text(graph, link, path, out),
            Segment::Link { link } => {
                out.push('[');
                out.push_str(link);
                out.push(']');
            }
        }
    }
    path.pop();
}

/// Returns a single-line preview of at most `max_chars` characters.
///
/// Whitespace runs collapse to one space; truncated previews end in `…`.
pub fn preview_text(graph: &Graph, thing: &str, max_chars: usize) -> String {
    let text = content_text(graph, thing);
    let collapsed = WHITESPACE_RE.replace_all(text.trim(), " ");
    if collapsed.chars().count() <= max_chars {
        return collapsed.into_owned();
    }
    let mut preview: String = collapsed.chars().take(max_chars.saturating_sub(1)).collect();
    preview.push('…');
    preview
}

/// One thing with its flattened text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub thing: ThingId,
    pub text: String,
}

/// Returns the flattened text of every thing, in id order.
pub fn search_items(graph: &Graph) -> Vec<SearchItem> {
    graph
        .all_things()
        .into_iter()
        .map(|thing| SearchItem {
            text: content_text(graph, &thing),
            thing,
        })
        .collect()
}

/// Options for [`search`].
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Whitespace-separated terms; every term must match.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 20,
        }
    }
}

/// Returns items containing every query term, case-insensitively.
///
/// Blank queries and a zero limit return nothing.
pub fn search(graph: &Graph, query: &SearchQuery) -> Vec<SearchItem> {
    let terms: Vec<String> = query
        .text
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() || query.limit == 0 {
        return Vec::new();
    }

    search_items(graph)
        .into_iter()
        .filter(|item| {
            let haystack = item.text.to_lowercase();
            terms.iter().all(|term| haystack.contains(term.as_str()))
        })
        .take(query.limit)
        .collect()
}
