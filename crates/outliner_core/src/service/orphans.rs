//! Orphan scan: things the root can no longer reach.
//!
//! Reachability follows children, parents, outgoing links and
//! backreferences, so an item only counts as an orphan when nothing in the
//! root's connected component mentions it.

use crate::model::content::ThingId;
use crate::model::graph::{Graph, ROOT_THING};
use std::collections::{BTreeSet, VecDeque};

/// Returns every thing unreachable from the root, in id order.
pub fn orphans(graph: &Graph) -> Vec<ThingId> {
    let mut reached: BTreeSet<ThingId> = BTreeSet::new();
    let mut pending = VecDeque::from([ROOT_THING.to_string()]);

    while let Some(thing) = pending.pop_front() {
        if !graph.exists(&thing) || !reached.insert(thing.clone()) {
            continue;
        }
        let neighbours = graph
            .children(&thing)
            .into_iter()
            .chain(graph.parents(&thing))
            .chain(graph.references(&thing))
            .chain(graph.backreferences(&thing));
        pending.extend(neighbours.filter(|next| !reached.contains(next)));
    }

    graph
        .all_things()
        .into_iter()
        .filter(|thing| !reached.contains(thing))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::orphans;
    use crate::model::content::Segment;
    use crate::model::graph::{Graph, ROOT_THING};

    #[test]
    fn links_and_parents_keep_items_reachable() {
        let mut graph = Graph::new();
        graph.add_child(ROOT_THING, "a", None).unwrap();
        graph.create(Some("b")).unwrap();
        graph.add_child("b", "a", None).unwrap();
        graph.create(Some("linked")).unwrap();
        graph.set_content("a", vec![Segment::link("linked")]);
        graph.create(Some("lonely")).unwrap();

        assert_eq!(orphans(&graph), vec!["lonely"]);
    }
}
