//! Snapshot diffing for the synchronization collaborator.
//!
//! # Responsibility
//! - Classify every thing whose record differs between two graphs.
//! - Turn that classification into the minimal update payloads a server
//!   expects (`effects`).
//!
//! # Invariants
//! - `diff(g, g)` is empty for every graph `g`.
//! - Each thing lands in at most one bucket; buckets are in thing-id order.

use crate::model::content::{Content, ThingId};
use crate::model::graph::Graph;
use crate::sync::snapshot::{FullStateChild, FullStateThing};
use serde::{Deserialize, Serialize};

/// Things that differ between two graph snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    /// Present only in the new graph.
    pub added: Vec<ThingId>,
    /// Present only in the old graph.
    pub deleted: Vec<ThingId>,
    /// Structure differs (children, parents or connection records).
    pub changed: Vec<ThingId>,
    /// Only content differs.
    pub changed_content: Vec<ThingId>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.changed.is_empty()
            && self.changed_content.is_empty()
    }
}

/// Classifies every thing of `old` and `new`.
pub fn diff(old: &Graph, new: &Graph) -> Diff {
    let mut result = Diff::default();

    for thing in old.all_things() {
        let (Some(before), Some(after)) = (old.thing_record(&thing), new.thing_record(&thing))
        else {
            result.deleted.push(thing);
            continue;
        };

        if before == after {
            let connections_differ = before.children.iter().any(|connection| {
                old.connection_record(connection) != new.connection_record(connection)
            });
            if connections_differ {
                result.changed.push(thing);
            }
        } else if before.children == after.children && before.parents == after.parents {
            result.changed_content.push(thing);
        } else {
            result.changed.push(thing);
        }
    }

    result.added = new
        .all_things()
        .into_iter()
        .filter(|thing| !old.exists(thing))
        .collect();

    result
}

/// A content-only edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedThing {
    pub thing: ThingId,
    pub content: Content,
}

/// Update messages needed to bring a remote copy from `old` to `new`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    pub deleted: Vec<ThingId>,
    pub edited: Vec<EditedThing>,
    pub updated: Vec<FullStateThing>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.edited.is_empty() && self.updated.is_empty()
    }
}

/// Builds update messages from `diff(old, new)`.
///
/// Content-only changes become `edited` entries; added and structurally
/// changed things are sent whole, with their ordered child connections.
pub fn effects(old: &Graph, new: &Graph) -> Effects {
    let Diff {
        added,
        deleted,
        changed,
        changed_content,
    } = diff(old, new);

    let edited = changed_content
        .into_iter()
        .map(|thing| EditedThing {
            content: new.content(&thing).to_vec(),
            thing,
        })
        .collect();

    let updated = added
        .into_iter()
        .chain(changed)
        .map(|thing| FullStateThing {
            content: new.content(&thing).to_vec(),
            children: new
                .child_connections(&thing)
                .iter()
                .filter_map(|connection| {
                    new.connection_child(connection).map(|child| FullStateChild {
                        name: connection.clone(),
                        child: child.to_string(),
                    })
                })
                .collect(),
            name: thing,
        })
        .collect();

    Effects {
        deleted,
        edited,
        updated,
    }
}
