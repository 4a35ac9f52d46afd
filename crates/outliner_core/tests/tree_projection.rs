use outliner_core::tree::projection;
use outliner_core::{
    from_root, refresh, Graph, NodeKind, NodeRef, NodeStatus, Segment, Tree, ROOT_THING,
};

fn child_things(tree: &Tree, node: NodeRef) -> Vec<String> {
    tree.children(node)
        .iter()
        .map(|n| tree.thing(*n).unwrap().to_string())
        .collect()
}

fn graph_with(children: &[&str]) -> Graph {
    let mut graph = Graph::new();
    for child in children {
        graph.add_child(ROOT_THING, child, None).unwrap();
    }
    graph
}

#[test]
fn bare_tree_has_collapsed_root() {
    let tree = Tree::from_root(ROOT_THING);
    let root = tree.root();
    assert_eq!(root.id, 0);
    assert!(!tree.expanded(root));
    assert!(tree.children(root).is_empty());
    assert_eq!(tree.focused(), None);
}

#[test]
fn toggling_root_loads_children_in_order() {
    let graph = graph_with(&["1", "2"]);
    let mut tree = Tree::from_root(ROOT_THING);
    let root = tree.root();

    projection::toggle(&graph, &mut tree, root);

    assert!(tree.expanded(root));
    assert_eq!(child_things(&tree, root), vec!["1", "2"]);
    for child in tree.children(root) {
        assert_eq!(tree.kind(*child), Some(NodeKind::Child));
        assert_eq!(tree.structural_parent(*child), Some(root));
    }
}

#[test]
fn leaves_are_pinned_open() {
    let graph = graph_with(&["leaf"]);
    let mut tree = from_root(&graph, ROOT_THING);
    let leaf = tree.children(tree.root())[0];
    assert!(tree.expanded(leaf));
    assert_eq!(tree.status(leaf), NodeStatus::Terminal);

    projection::toggle(&graph, &mut tree, leaf);
    assert!(tree.expanded(leaf));
    projection::toggle(&graph, &mut tree, leaf);
    assert!(tree.expanded(leaf));
}

#[test]
fn collapsing_keeps_loaded_children_and_reexpanding_reuses_them() {
    let mut graph = graph_with(&["a"]);
    graph.add_child("a", "b", None).unwrap();
    let mut tree = from_root(&graph, ROOT_THING);
    let a = tree.children(tree.root())[0];

    projection::toggle(&graph, &mut tree, a);
    let b = tree.children(a)[0];
    projection::toggle(&graph, &mut tree, a);
    assert_eq!(tree.status(a), NodeStatus::Collapsed);

    projection::toggle(&graph, &mut tree, a);
    assert_eq!(tree.children(a), &[b]);
}

#[test]
fn stale_collapsed_children_catch_up_on_expand() {
    let mut graph = graph_with(&["a"]);
    graph.add_child("a", "b", None).unwrap();
    let mut tree = from_root(&graph, ROOT_THING);
    let a = tree.children(tree.root())[0];
    projection::toggle(&graph, &mut tree, a);
    projection::toggle(&graph, &mut tree, a);

    graph.add_child("a", "c", None).unwrap();
    projection::refresh_children(&graph, &mut tree, a);
    assert_eq!(child_things(&tree, a), vec!["b"]);

    projection::toggle(&graph, &mut tree, a);
    assert_eq!(child_things(&tree, a), vec!["b", "c"]);
}

#[test]
fn from_root_opens_parents_and_backreferences_of_the_root() {
    let mut graph = graph_with(&["p", "item"]);
    graph.add_child("p", "item", None).unwrap();
    graph.create(Some("ref")).unwrap();
    graph.set_content("ref", vec![Segment::text("about "), Segment::link("item")]);

    let tree = from_root(&graph, "item");
    let root = tree.root();

    assert!(tree.other_parents_expanded(root));
    let parents: Vec<&str> = tree
        .other_parents_children(root)
        .iter()
        .map(|n| tree.thing(*n).unwrap())
        .collect();
    assert_eq!(parents, vec!["p", ROOT_THING]);
    assert!(tree.backreferences_expanded(root));
    let references: Vec<&str> = tree
        .backreferences_children(root)
        .iter()
        .map(|n| tree.thing(*n).unwrap())
        .collect();
    assert_eq!(references, vec!["ref"]);
    assert_eq!(
        tree.kind(tree.backreferences_children(root)[0]),
        Some(NodeKind::Reference)
    );
    assert_eq!(
        tree.kind(tree.other_parents_children(root)[0]),
        Some(NodeKind::Parent)
    );
}

#[test]
fn single_link_references_open_without_looping() {
    let mut graph = Graph::new();
    graph.create(Some("a")).unwrap();
    graph.create(Some("b")).unwrap();
    graph.set_content("a", vec![Segment::link("b")]);
    graph.set_content("b", vec![Segment::link("a")]);

    let tree = from_root(&graph, "a");
    let reference = tree.backreferences_children(tree.root())[0];
    assert_eq!(tree.thing(reference), Some("b"));
    assert!(tree.expanded(reference));

    let inner = tree.backreferences_children(reference)[0];
    assert_eq!(tree.thing(inner), Some("a"));
    assert!(!tree.expanded(inner));
}

#[test]
fn opening_a_link_loads_one_opened_node() {
    let mut graph = graph_with(&["n"]);
    graph.create(Some("x")).unwrap();
    graph.set_content("n", vec![Segment::text("go to "), Segment::link("x")]);
    let mut tree = from_root(&graph, ROOT_THING);
    let n = tree.children(tree.root())[0];

    projection::toggle_link(&graph, &mut tree, n, "x");

    assert!(tree.is_link_open(n, "x"));
    let opened = tree.opened_links_children(n);
    assert_eq!(opened.len(), 1);
    assert_eq!(tree.thing(opened[0]), Some("x"));
    assert!(tree.expanded(opened[0]));
    assert_eq!(tree.kind(opened[0]), Some(NodeKind::OpenedLink));
    assert!(tree.expanded(n));

    projection::toggle_link(&graph, &mut tree, n, "x");
    assert!(!tree.is_link_open(n, "x"));
    assert!(!tree.exists(opened[0]));
}

#[test]
fn refresh_follows_graph_replacement() {
    let mut graph = graph_with(&["a", "b"]);
    let mut tree = from_root(&graph, ROOT_THING);
    let a = tree.children(tree.root())[0];
    let b = tree.children(tree.root())[1];

    graph.remove("b");
    refresh(&graph, &mut tree);
    assert_eq!(child_things(&tree, tree.root()), vec!["a"]);
    assert!(!tree.exists(b));
    assert!(tree.instances("b").is_empty());

    graph.add_child(ROOT_THING, "c", None).unwrap();
    refresh(&graph, &mut tree);
    assert_eq!(child_things(&tree, tree.root()), vec!["a", "c"]);
    assert_eq!(tree.children(tree.root())[0], a);
}

#[test]
fn instances_track_every_projection_of_a_thing() {
    let mut graph = graph_with(&["p", "q"]);
    graph.add_child("p", "shared", None).unwrap();
    graph.add_child("q", "shared", None).unwrap();
    let mut tree = from_root(&graph, ROOT_THING);
    let p = tree.children(tree.root())[0];
    let q = tree.children(tree.root())[1];

    projection::expand(&graph, &mut tree, p);
    projection::expand(&graph, &mut tree, q);

    let shared = tree.instances("shared");
    assert_eq!(shared.len(), 2);
    assert!(shared.contains(&tree.children(p)[0]));
    assert!(shared.contains(&tree.children(q)[0]));
}
