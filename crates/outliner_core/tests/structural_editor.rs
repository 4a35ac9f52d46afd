use outliner_core::service::editor;
use outliner_core::{
    from_root, Destination, EditError, Graph, GraphError, NodeRef, Segment, Tree, UndoStack,
    ROOT_THING,
};

fn graph_with(children: &[&str]) -> Graph {
    let mut graph = Graph::new();
    for child in children {
        graph.add_child(ROOT_THING, child, None).unwrap();
    }
    graph
}

fn child_path(tree: &Tree, path: &[usize]) -> NodeRef {
    path.iter()
        .fold(tree.root(), |node, index| tree.children(node)[*index])
}

fn children_things(tree: &Tree, path: &[usize]) -> Vec<String> {
    tree.children(child_path(tree, path))
        .iter()
        .map(|n| tree.thing(*n).unwrap().to_string())
        .collect()
}

#[test]
fn indent_makes_node_last_child_of_previous_sibling() {
    let graph = graph_with(&["a", "b"]);
    let tree = from_root(&graph, ROOT_THING);
    let b = child_path(&tree, &[1]);

    let edit = editor::indent(&graph, &tree, b).unwrap();

    assert_eq!(edit.graph.children("a"), vec!["b"]);
    assert_eq!(edit.graph.children(ROOT_THING), vec!["a"]);
    assert_eq!(children_things(&edit.tree, &[]), vec!["a"]);
    assert_eq!(children_things(&edit.tree, &[0]), vec!["b"]);
    assert_eq!(edit.node, Some(b));
    assert_eq!(child_path(&edit.tree, &[0, 0]), b);
}

#[test]
fn indent_of_first_child_or_root_changes_nothing() {
    let graph = graph_with(&["a", "b"]);
    let tree = from_root(&graph, ROOT_THING);

    let first = editor::indent(&graph, &tree, child_path(&tree, &[0])).unwrap();
    assert_eq!(first.graph, graph);
    assert_eq!(first.tree, tree);

    let root = editor::indent(&graph, &tree, tree.root()).unwrap();
    assert_eq!(root.graph, graph);
    assert_eq!(root.tree, tree);
}

#[test]
fn unindent_places_node_after_its_parent() {
    let mut graph = graph_with(&["a", "c"]);
    graph.add_child("a", "b", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let tree = editor::expand(&graph, &tree, child_path(&tree, &[0])).unwrap();

    let edit = editor::unindent(&graph, &tree, child_path(&tree, &[0, 0])).unwrap();

    assert_eq!(edit.graph.children(ROOT_THING), vec!["a", "b", "c"]);
    assert!(edit.graph.children("a").is_empty());
    assert_eq!(children_things(&edit.tree, &[]), vec!["a", "b", "c"]);
}

#[test]
fn move_up_and_down_swap_neighbours() {
    let graph = graph_with(&["a", "b", "c"]);
    let tree = from_root(&graph, ROOT_THING);

    let down = editor::move_down(&graph, &tree, child_path(&tree, &[0])).unwrap();
    assert_eq!(down.graph.children(ROOT_THING), vec!["b", "a", "c"]);
    assert_eq!(children_things(&down.tree, &[]), vec!["b", "a", "c"]);

    let up = editor::move_up(&down.graph, &down.tree, child_path(&down.tree, &[2])).unwrap();
    assert_eq!(up.graph.children(ROOT_THING), vec!["b", "c", "a"]);

    let top = editor::move_up(&up.graph, &up.tree, child_path(&up.tree, &[0])).unwrap();
    assert_eq!(top.graph, up.graph);
}

#[test]
fn moving_the_root_does_nothing() {
    let graph = graph_with(&["1"]);
    let tree = from_root(&graph, ROOT_THING);
    let destination = Destination {
        parent: child_path(&tree, &[0]),
        index: 0,
    };

    let edit = editor::move_node(&graph, &tree, tree.root(), destination).unwrap();

    assert_eq!(edit.graph, graph);
    assert_eq!(edit.tree, tree);
    assert!(children_things(&edit.tree, &[0]).is_empty());
}

#[test]
fn moving_a_leaf_into_a_leaf() {
    let graph = graph_with(&["1", "2"]);
    let tree = from_root(&graph, ROOT_THING);
    let moving = child_path(&tree, &[1]);
    let destination = Destination {
        parent: child_path(&tree, &[0]),
        index: 0,
    };

    let edit = editor::move_node(&graph, &tree, moving, destination).unwrap();

    assert_eq!(edit.graph.children(ROOT_THING), vec!["1"]);
    assert_eq!(edit.graph.children("1"), vec!["2"]);
    assert_eq!(children_things(&edit.tree, &[]), vec!["1"]);
    assert_eq!(children_things(&edit.tree, &[0]), vec!["2"]);
    assert_eq!(edit.node, Some(moving));
    assert_eq!(child_path(&edit.tree, &[0, 0]), moving);
}

#[test]
fn moving_out_of_a_parent_shown_twice_empties_both() {
    let mut graph = graph_with(&["new-parent", "old-parent", "old-parent"]);
    graph.add_child("old-parent", "moving", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let tree = editor::expand(&graph, &tree, child_path(&tree, &[1])).unwrap();
    let tree = editor::expand(&graph, &tree, child_path(&tree, &[2])).unwrap();
    assert_eq!(children_things(&tree, &[1]), vec!["moving"]);
    assert_eq!(children_things(&tree, &[2]), vec!["moving"]);

    let destination = Destination {
        parent: child_path(&tree, &[0]),
        index: 0,
    };
    let edit = editor::move_node(&graph, &tree, child_path(&tree, &[1, 0]), destination).unwrap();

    assert!(children_things(&edit.tree, &[1]).is_empty());
    assert!(children_things(&edit.tree, &[2]).is_empty());
    assert_eq!(children_things(&edit.tree, &[0]), vec!["moving"]);
    assert_eq!(edit.tree.instances("moving").len(), 1);
}

#[test]
fn moving_into_a_parent_shown_twice_fills_both() {
    let graph = graph_with(&["new-parent", "new-parent", "moving"]);
    let tree = from_root(&graph, ROOT_THING);
    let destination = Destination {
        parent: child_path(&tree, &[0]),
        index: 0,
    };

    let edit = editor::move_node(&graph, &tree, child_path(&tree, &[2]), destination).unwrap();

    assert_eq!(children_things(&edit.tree, &[0]), vec!["moving"]);
    assert_eq!(children_things(&edit.tree, &[1]), vec!["moving"]);
    let first = child_path(&edit.tree, &[0]);
    let second = child_path(&edit.tree, &[1]);
    assert_eq!(edit.tree.structural_parent(child_path(&edit.tree, &[0, 0])), Some(first));
    assert_eq!(edit.tree.structural_parent(child_path(&edit.tree, &[1, 0])), Some(second));
    assert_eq!(children_things(&edit.tree, &[]), vec!["new-parent", "new-parent"]);
}

#[test]
fn moving_into_own_subtree_is_refused() {
    let mut graph = graph_with(&["a"]);
    graph.add_child("a", "b", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let a = child_path(&tree, &[0]);
    let tree = editor::expand(&graph, &tree, a).unwrap();
    let b = child_path(&tree, &[0, 0]);

    let into_child = editor::move_node(&graph, &tree, a, Destination { parent: b, index: 0 }).unwrap();
    assert_eq!(into_child.graph, graph);

    let into_self = editor::move_node(&graph, &tree, a, Destination { parent: a, index: 0 }).unwrap();
    assert_eq!(into_self.tree, tree);

    let mut cyclic = graph.clone();
    cyclic.add_child("b", "a", None).unwrap();
    assert_eq!(cyclic.children("b"), vec!["a"]);
}

#[test]
fn moved_node_keeps_its_subtree_and_focus() {
    let mut graph = graph_with(&["a", "b"]);
    graph.add_child("b", "inner", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let b = child_path(&tree, &[1]);
    let mut tree = editor::expand(&graph, &tree, b).unwrap();
    let inner = child_path(&tree, &[1, 0]);
    tree.focus(b);

    let edit = editor::indent(&graph, &tree, b).unwrap();

    assert!(edit.tree.expanded(b));
    assert_eq!(edit.tree.children(b), &[inner]);
    assert!(edit.tree.has_focus(b));
}

#[test]
fn destroying_a_shared_item_removes_it_everywhere() {
    let mut graph = graph_with(&["p", "q"]);
    graph.add_child("p", "t", None).unwrap();
    graph.add_child("q", "t", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let tree = editor::expand(&graph, &tree, child_path(&tree, &[0])).unwrap();
    let tree = editor::expand(&graph, &tree, child_path(&tree, &[1])).unwrap();

    let edit = editor::destroy(&graph, &tree, child_path(&tree, &[0, 0])).unwrap();

    assert!(!edit.graph.exists("t"));
    assert!(edit.graph.children("p").is_empty());
    assert!(edit.graph.children("q").is_empty());
    assert!(edit.tree.instances("t").is_empty());
    assert!(children_things(&edit.tree, &[0]).is_empty());
    assert!(children_things(&edit.tree, &[1]).is_empty());
    assert_eq!(edit.tree.focused(), Some(child_path(&edit.tree, &[0])));
}

#[test]
fn destroying_the_root_thing_is_refused() {
    let graph = graph_with(&["a"]);
    let tree = from_root(&graph, ROOT_THING);

    let edit = editor::destroy(&graph, &tree, tree.root()).unwrap();

    assert!(edit.graph.exists(ROOT_THING));
    assert_eq!(edit.graph, graph);
}

#[test]
fn indent_then_remove_thing_empties_the_new_parent() {
    let mut graph = graph_with(&["a", "b"]);
    graph.set_content(ROOT_THING, vec![Segment::text("Root")]);
    let tree = from_root(&graph, ROOT_THING);

    let indented = editor::indent(&graph, &tree, child_path(&tree, &[1])).unwrap();
    let a = child_path(&indented.tree, &[0]);
    assert_eq!(indented.tree.children(a).len(), 1);

    let node = indented.tree.children(a)[0];
    let removed = editor::remove_thing(&indented.graph, &indented.tree, node).unwrap();
    assert!(removed.tree.children(a).is_empty());
    assert!(!removed.graph.exists("b"));
}

#[test]
fn remove_ignores_the_parent_connection_of_the_root() {
    let mut graph = graph_with(&["child"]);
    graph.create(Some("parent")).unwrap();
    graph.add_child("parent", ROOT_THING, None).unwrap();
    let tree = from_root(&graph, ROOT_THING);

    let edit = editor::remove(&graph, &tree, child_path(&tree, &[0])).unwrap();

    assert!(edit.graph.children(ROOT_THING).is_empty());
    assert_eq!(edit.graph.children("parent"), vec![ROOT_THING]);
    assert!(edit.graph.exists("child"));
}

#[test]
fn removing_an_inline_parent_disconnects_it() {
    let mut graph = graph_with(&["item"]);
    graph.create(Some("p")).unwrap();
    graph.add_child("p", "item", None).unwrap();
    let tree = from_root(&graph, "item");
    let parent = tree
        .other_parents_children(tree.root())
        .iter()
        .copied()
        .find(|n| tree.thing(*n) == Some("p"))
        .unwrap();

    let edit = editor::remove(&graph, &tree, parent).unwrap();

    assert!(edit.graph.children("p").is_empty());
    assert_eq!(edit.graph.parents("item"), vec![ROOT_THING]);
}

#[test]
fn removing_a_reference_does_nothing() {
    let mut graph = graph_with(&["item", "ref"]);
    graph.set_content("ref", vec![Segment::text("see "), Segment::link("item")]);
    let tree = from_root(&graph, "item");
    let reference = tree.backreferences_children(tree.root())[0];

    let edit = editor::remove(&graph, &tree, reference).unwrap();

    assert_eq!(edit.graph, graph);
}

#[test]
fn created_sibling_takes_focus() {
    let graph = graph_with(&["a"]);
    let mut tree = from_root(&graph, ROOT_THING);
    tree.focus(child_path(&tree, &[0]));

    let edit = editor::create_sibling_after(&graph, &tree, child_path(&tree, &[0])).unwrap();

    let created = child_path(&edit.tree, &[1]);
    assert!(edit.tree.has_focus(created));
    assert_eq!(edit.node, Some(created));
    assert_eq!(edit.graph.children(ROOT_THING).len(), 2);
    assert!(edit.graph.content(edit.tree.thing(created).unwrap()).is_empty());

    let before = editor::create_sibling_before(&graph, &tree, child_path(&tree, &[0])).unwrap();
    assert_eq!(before.graph.children(ROOT_THING)[1], "a");
}

#[test]
fn creating_a_sibling_of_the_root_is_an_error() {
    let graph = graph_with(&["a"]);
    let tree = from_root(&graph, ROOT_THING);

    let result = editor::create_sibling_after(&graph, &tree, tree.root());

    assert_eq!(result, Err(EditError::NoStructuralParent(tree.root())));
}

#[test]
fn create_child_puts_new_item_first() {
    let mut graph = graph_with(&["a"]);
    graph.add_child("a", "b", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let a = child_path(&tree, &[0]);

    let edit = editor::create_child(&graph, &tree, a).unwrap();

    let children = edit.graph.children("a");
    assert_eq!(children.len(), 2);
    assert_eq!(children[1], "b");
    assert!(edit.tree.expanded(a));
    assert_eq!(edit.tree.children(a)[0], edit.node.unwrap());
    assert!(edit.tree.has_focus(edit.node.unwrap()));
}

#[test]
fn stale_nodes_are_rejected() {
    let graph = graph_with(&["a"]);
    let tree = from_root(&graph, ROOT_THING);
    let missing = NodeRef::new(99);

    assert_eq!(
        editor::indent(&graph, &tree, missing),
        Err(EditError::NodeNotFound(missing))
    );
    assert_eq!(
        editor::toggle(&graph, &tree, missing),
        Err(EditError::NodeNotFound(missing))
    );
}

#[test]
fn copy_adds_a_second_placement() {
    let graph = graph_with(&["a", "b"]);
    let tree = from_root(&graph, ROOT_THING);
    let a = child_path(&tree, &[0]);

    let edit = editor::copy(&graph, &tree, a, Destination { parent: tree.root(), index: 2 }).unwrap();

    assert_eq!(edit.graph.children(ROOT_THING), vec!["a", "b", "a"]);
    assert_eq!(children_things(&edit.tree, &[]), vec!["a", "b", "a"]);
    assert!(edit.tree.exists(a));
    assert_eq!(edit.node, Some(child_path(&edit.tree, &[2])));
    assert_eq!(edit.tree.instances("a").len(), 2);
}

#[test]
fn replace_destroys_a_blank_item() {
    let mut graph = graph_with(&["a", "blank"]);
    graph.create(Some("x")).unwrap();
    let tree = from_root(&graph, ROOT_THING);

    let edit = editor::replace(&graph, &tree, child_path(&tree, &[1]), "x").unwrap();

    assert_eq!(edit.graph.children(ROOT_THING), vec!["a", "x"]);
    assert!(!edit.graph.exists("blank"));
    assert_eq!(children_things(&edit.tree, &[]), vec!["a", "x"]);
}

#[test]
fn replace_keeps_an_item_with_content() {
    let mut graph = graph_with(&["a", "b"]);
    graph.set_content("b", vec![Segment::text("keep me")]);
    graph.create(Some("x")).unwrap();
    let tree = from_root(&graph, ROOT_THING);

    let edit = editor::replace(&graph, &tree, child_path(&tree, &[1]), "x").unwrap();

    assert_eq!(edit.graph.children(ROOT_THING), vec!["a", "x"]);
    assert!(edit.graph.exists("b"));
}

#[test]
fn insert_parent_adds_a_parent_without_moving() {
    let mut graph = graph_with(&["a"]);
    graph.create(Some("p")).unwrap();
    let tree = from_root(&graph, ROOT_THING);
    let a = child_path(&tree, &[0]);

    let edit = editor::insert_parent(&graph, &tree, a, "p").unwrap();

    assert_eq!(edit.graph.children("p"), vec!["a"]);
    assert_eq!(edit.graph.children(ROOT_THING), vec!["a"]);
    let shown: Vec<&str> = edit
        .tree
        .other_parents_children(a)
        .iter()
        .map(|n| edit.tree.thing(*n).unwrap())
        .collect();
    assert_eq!(shown, vec!["p"]);

    assert_eq!(
        editor::insert_parent(&graph, &tree, a, "nope"),
        Err(EditError::Graph(GraphError::ThingNotFound("nope".to_string())))
    );
}

#[test]
fn insert_sibling_after_places_existing_thing() {
    let mut graph = graph_with(&["a", "b"]);
    graph.create(Some("x")).unwrap();
    let tree = from_root(&graph, ROOT_THING);

    let edit = editor::insert_sibling_after(&graph, &tree, child_path(&tree, &[0]), "x").unwrap();

    assert_eq!(edit.graph.children(ROOT_THING), vec!["a", "x", "b"]);
    assert!(edit.tree.has_focus(child_path(&edit.tree, &[1])));
}

#[test]
fn focus_walks_the_visible_outline() {
    let graph = graph_with(&["a", "b"]);
    let mut tree = from_root(&graph, ROOT_THING);
    let a = child_path(&tree, &[0]);
    let b = child_path(&tree, &[1]);

    assert_eq!(editor::focus_down(&tree), Err(EditError::NothingFocused));
    assert_eq!(editor::focus_up(&tree), Err(EditError::NothingFocused));

    tree.focus(a);
    let tree = editor::focus_down(&tree).unwrap();
    assert_eq!(tree.focused(), Some(b));
    let tree = editor::focus_down(&tree).unwrap();
    assert_eq!(tree.focused(), Some(b));
    let tree = editor::focus_up(&tree).unwrap();
    assert_eq!(tree.focused(), Some(a));
    let tree = editor::focus_up(&tree).unwrap();
    assert_eq!(tree.focused(), Some(tree.root()));
}

#[test]
fn unfold_terminates_on_cycles() {
    let mut graph = graph_with(&["a"]);
    graph.add_child("a", ROOT_THING, None).unwrap();
    graph.add_child("a", "b", None).unwrap();
    graph.add_child("b", "c", None).unwrap();
    let tree = from_root(&graph, ROOT_THING);

    let tree = editor::unfold(&graph, &tree, tree.root()).unwrap();

    let a = child_path(&tree, &[0]);
    assert!(tree.expanded(a));
    assert_eq!(children_things(&tree, &[0]), vec![ROOT_THING, "b"]);
    assert!(!tree.expanded(child_path(&tree, &[0, 0])));
    assert!(tree.expanded(child_path(&tree, &[0, 1])));
    assert_eq!(children_things(&tree, &[0, 1]), vec!["c"]);
}

#[test]
fn undo_restores_the_state_before_an_edit() {
    let graph = graph_with(&["a", "b"]);
    let tree = from_root(&graph, ROOT_THING);
    let mut history = UndoStack::new();

    history.push(&graph, &tree);
    let edit = editor::indent(&graph, &tree, child_path(&tree, &[1])).unwrap();
    assert_ne!(edit.graph, graph);

    let snapshot = history.pop().unwrap();
    assert_eq!(snapshot.graph, graph);
    assert_eq!(snapshot.tree, tree);
    assert!(history.is_empty());
}
