//! Thing content model.
//!
//! # Responsibility
//! - Define the ordered segment list stored as a thing's content.
//! - Derive outgoing links from content without a stored edge.
//!
//! # Invariants
//! - Content is replaced wholesale; segments are never patched in place.
//! - A link segment references a thing id, which may or may not exist.

use serde::{Deserialize, Serialize};

/// Stable identifier of a thing in the graph.
///
/// Kept as a type alias so wire payloads and map keys stay plain strings.
pub type ThingId = String;

/// One run of content: plain text or an inline link to another thing.
///
/// Serialized untagged, so a content array reads `["text", {"link": "1"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Text(String),
    Link { link: ThingId },
}

impl Segment {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn link(target: impl Into<ThingId>) -> Self {
        Self::Link {
            link: target.into(),
        }
    }

    /// Returns the linked thing id for link segments.
    pub fn as_link(&self) -> Option<&str> {
        match self {
            Self::Link { link } => Some(link.as_str()),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered segments making up a thing's content.
pub type Content = Vec<Segment>;

/// Returns every linked thing once, in order of first appearance.
pub fn links_in_content(content: &[Segment]) -> Vec<ThingId> {
    let mut links: Vec<ThingId> = Vec::new();
    for target in content.iter().filter_map(Segment::as_link) {
        if !links.iter().any(|existing| existing == target) {
            links.push(target.to_string());
        }
    }
    links
}

/// Returns whether content holds nothing but empty text runs.
pub fn is_blank(content: &[Segment]) -> bool {
    content.iter().all(|segment| match segment {
        Segment::Text(text) => text.is_empty(),
        Segment::Link { .. } => false,
    })
}

/// Returns whether content is exactly one link segment.
pub fn is_single_link(content: &[Segment]) -> bool {
    matches!(content, [Segment::Link { .. }])
}
