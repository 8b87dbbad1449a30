use super::*;

fn ids_of(store: &MindMapStore) -> Vec<&str> {
    store.nodes().iter().map(|n| n.id.as_str()).collect()
}

fn assert_edges_reference_nodes(store: &MindMapStore) {
    for edge in store.edges() {
        assert!(store.node(&edge.source).is_some(), "dangling source in {edge:?}");
        assert!(store.node(&edge.target).is_some(), "dangling target in {edge:?}");
    }
}

#[test]
fn example_scenario_cascades_edge_removal() {
    let mut store = MindMapStore::new();
    let n1 = store.add_node(Position::new(0.0, 0.0), Some("A"));
    let n2 = store.add_node(Position::new(100.0, 0.0), Some("B"));
    let e1 = store.add_edge(&n1, &n2).unwrap();
    assert_eq!((n1.as_str(), n2.as_str(), e1.as_str()), ("n1", "n2", "e1"));

    assert!(store.delete_node(&n1));

    assert_eq!(store.nodes().len(), 1);
    assert_eq!(store.nodes()[0].label, "B");
    assert!(store.edges().is_empty());
}

#[test]
fn add_node_selects_it_and_applies_defaults() {
    let mut store = MindMapStore::new();
    let id = store.add_node(Position::new(5.0, 6.0), None);

    let node = store.node(&id).unwrap();
    assert_eq!(node.label, "New Node");
    assert_eq!(node.style, NodeStyle::initial());
    assert_eq!(store.selection(), &Selection::Node(id.clone()));
    assert!(store.can_undo());
}

#[test]
fn referential_invariant_holds_across_mixed_operations() {
    let mut store = MindMapStore::new();
    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(store.add_node(Position::new(i as f32 * 50.0, 0.0), None));
    }
    for pair in ids.windows(2) {
        store.add_edge(&pair[0], &pair[1]).unwrap();
    }
    store.add_edge(&ids[0], &ids[5]).unwrap();

    for id in [&ids[2], &ids[0], &ids[4]] {
        store.delete_node(id);
        assert_edges_reference_nodes(&store);
    }
    store.apply_node_changes(&[NodeChange::Remove { id: ids[1].clone() }]);
    assert_edges_reference_nodes(&store);
    assert!(store.edges().is_empty());
}

#[test]
fn add_edge_rejects_missing_endpoints() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let history_len = store.history().len();

    let err = store.add_edge(&a, "ghost").unwrap_err();
    assert_eq!(
        err,
        StoreError::MissingEndpoint {
            node_id: "ghost".into()
        }
    );
    assert!(store.add_edge("ghost", &a).is_err());
    assert!(store.edges().is_empty());
    assert_eq!(store.history().len(), history_len);
}

#[test]
fn self_loops_and_parallel_edges_are_allowed() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);

    store.add_edge(&a, &a).unwrap();
    store.add_edge(&a, &b).unwrap();
    store.add_edge(&a, &b).unwrap();
    assert_eq!(store.edges().len(), 3);
}

#[test]
fn load_then_export_round_trips() {
    let mut source = MindMapStore::new();
    let a = source.add_node(Position::new(1.0, 2.0), Some("A"));
    let b = source.add_node(Position::new(300.0, 2.0), Some("B"));
    source.add_edge(&a, &b).unwrap();
    source.set_viewport(Viewport {
        x: 12.0,
        y: -3.0,
        zoom: 0.75,
    });
    let snapshot = source.export_snapshot();

    let mut store = MindMapStore::new();
    store.set_selected_node(Some("n9".into()));
    store.load_snapshot(snapshot.clone());

    assert_eq!(store.export_snapshot(), snapshot);
    assert_eq!(store.selection(), &Selection::None);
}

#[test]
fn load_drops_edges_with_missing_endpoints() {
    let snapshot = MindMapSnapshot {
        nodes: vec![NodeRecord::new("a".into(), "A", Position::default())],
        edges: vec![
            EdgeRecord::new("ok".into(), "a".into(), "a".into()),
            EdgeRecord::new("bad".into(), "a".into(), "missing".into()),
        ],
        viewport: Viewport::default(),
    };
    let mut store = MindMapStore::new();
    store.load_snapshot(snapshot);

    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].id, "ok");
}

#[test]
fn undo_and_redo_are_symmetric() {
    let mut store = MindMapStore::new();
    store.add_node(Position::default(), Some("first"));
    let before: Vec<NodeRecord> = store.nodes().to_vec();

    store.add_node(Position::new(10.0, 10.0), Some("X"));
    let after: Vec<NodeRecord> = store.nodes().to_vec();

    assert!(store.undo());
    assert_eq!(store.nodes(), before.as_slice());
    assert!(store.can_redo());

    assert!(store.redo());
    assert_eq!(store.nodes(), after.as_slice());
    assert!(!store.can_redo());
}

#[test]
fn first_add_is_undoable_back_to_empty() {
    let mut store = MindMapStore::new();
    store.add_node(Position::default(), None);
    assert!(store.undo());
    assert!(store.nodes().is_empty());
    assert!(!store.can_undo());
}

#[test]
fn undo_and_redo_do_not_record_history() {
    let mut store = MindMapStore::new();
    store.add_node(Position::default(), None);
    store.add_node(Position::default(), None);
    let len = store.history().len();

    store.undo();
    store.undo();
    store.redo();
    assert_eq!(store.history().len(), len);
    assert_eq!(store.history().cursor(), 1);
}

#[test]
fn undo_and_redo_are_noops_at_the_ends() {
    let mut store = MindMapStore::new();
    assert!(!store.undo());
    assert!(!store.redo());

    store.add_node(Position::default(), None);
    assert!(!store.redo());
    assert!(store.undo());
    assert!(!store.undo());
    assert_eq!(store.history().cursor(), 0);
}

#[test]
fn history_is_capped_at_fifty_entries() {
    let mut store = MindMapStore::new();
    for i in 0..60 {
        store.add_node(Position::new(i as f32, 0.0), None);
    }
    assert_eq!(store.history().len(), 50);

    let mut undos = 0;
    while store.undo() {
        undos += 1;
    }
    assert_eq!(undos, 49);
    // The oldest retained state is the one with 11 nodes: the baseline and
    // the first ten additions were evicted.
    assert_eq!(store.nodes().len(), 11);
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut store = MindMapStore::new();
    store.add_node(Position::default(), None);
    store.add_node(Position::default(), None);
    store.undo();
    assert!(store.can_redo());

    store.add_node(Position::default(), None);
    assert!(!store.can_redo());
}

#[test]
fn deleting_missing_node_changes_nothing() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);
    store.add_edge(&a, &b).unwrap();
    let snapshot = store.export_snapshot();
    let selection = store.selection().clone();
    let history_len = store.history().len();

    assert!(!store.delete_node("nope"));
    assert_eq!(store.export_snapshot(), snapshot);
    assert_eq!(store.selection(), &selection);
    assert_eq!(store.history().len(), history_len);
}

#[test]
fn delete_node_clears_its_selection() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);

    store.set_selected_node(Some(a.clone()));
    store.delete_node(&b);
    assert_eq!(store.selected_node_id(), Some(&a));

    store.delete_node(&a);
    assert_eq!(store.selection(), &Selection::None);
}

#[test]
fn delete_node_clears_selection_of_cascaded_edge() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);
    let e = store.add_edge(&a, &b).unwrap();
    store.set_selected_edge(Some(e));

    store.delete_node(&b);
    assert_eq!(store.selection(), &Selection::None);
}

#[test]
fn delete_edge_clears_selection_and_records_history() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);
    let e = store.add_edge(&a, &b).unwrap();
    store.set_selected_edge(Some(e.clone()));
    let history_len = store.history().len();

    assert!(store.delete_edge(&e));
    assert!(store.edges().is_empty());
    assert_eq!(store.selection(), &Selection::None);
    assert_eq!(store.history().len(), history_len + 1);

    assert!(!store.delete_edge(&e));
    assert_eq!(store.history().len(), history_len + 1);
}

#[test]
fn selection_is_mutually_exclusive() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let e = store.add_edge(&a, &a).unwrap();

    store.set_selected_edge(Some(e.clone()));
    assert_eq!(store.selected_node_id(), None);
    assert_eq!(store.selected_edge_id(), Some(&e));

    store.set_selected_node(Some(a.clone()));
    assert_eq!(store.selected_edge_id(), None);
    assert_eq!(store.selected_node_id(), Some(&a));
}

#[test]
fn update_node_merges_without_history() {
    let mut store = MindMapStore::new();
    let id = store.add_node(Position::default(), Some("old"));
    let history_len = store.history().len();

    assert!(store.update_node(&id, NodeUpdate::label("new")));
    assert!(store.update_node(
        &id,
        NodeUpdate::style(NodeStyle {
            font_weight: Some(FontWeight::Bold),
            ..Default::default()
        })
    ));

    let node = store.node(&id).unwrap();
    assert_eq!(node.label, "new");
    assert!(node.style.is_bold());
    assert_eq!(node.style.background_color.as_deref(), Some("#ffffff"));
    assert_eq!(store.history().len(), history_len);
    assert!(!store.update_node("missing", NodeUpdate::label("x")));
}

#[test]
fn style_edit_becomes_undoable_once_committed() {
    let mut store = MindMapStore::new();
    let id = store.add_node(Position::default(), Some("old"));
    store.update_node(&id, NodeUpdate::label("new"));
    store.save_to_history();

    store.undo();
    assert_eq!(store.node(&id).unwrap().label, "old");
}

#[test]
fn update_edge_merges_style() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let e = store.add_edge(&a, &a).unwrap();

    assert!(store.update_edge(
        &e,
        &EdgeStyle {
            stroke_width: Some(4.0),
            ..Default::default()
        }
    ));
    let edge = store.edge(&e).unwrap();
    assert_eq!(edge.style.stroke_width, Some(4.0));
    assert_eq!(edge.style.stroke.as_deref(), Some("#000000"));
    assert!(!store.update_edge("zzz", &EdgeStyle::default()));
}

#[test]
fn add_child_node_places_and_connects_child() {
    let mut store = MindMapStore::new();
    let parent = store.add_node(Position::new(40.0, 60.0), Some("P"));
    let history_len = store.history().len();

    let child = store.add_child_node(&parent, None).unwrap();
    let node = store.node(&child).unwrap();
    assert_eq!(node.position, Position::new(240.0, 60.0));
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].source, parent);
    assert_eq!(store.edges()[0].target, child);
    assert_eq!(store.history().len(), history_len + 1);
    assert!(store.add_child_node("missing", None).is_none());
}

#[test]
fn batched_position_changes_skip_history() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);
    let history_len = store.history().len();

    let summary = store.apply_node_changes(&[
        NodeChange::Position {
            id: a.clone(),
            position: Position::new(30.0, 0.0),
            dragging: true,
        },
        NodeChange::Position {
            id: b.clone(),
            position: Position::new(60.0, 0.0),
            dragging: false,
        },
        NodeChange::Position {
            id: "missing".into(),
            position: Position::default(),
            dragging: false,
        },
    ]);

    assert_eq!(summary.moved, 2);
    assert!(summary.dragging);
    assert!(summary.altered_graph());
    assert_eq!(store.node(&a).unwrap().position.x, 30.0);
    assert_eq!(store.node(&b).unwrap().position.x, 60.0);
    assert_eq!(store.history().len(), history_len);
}

#[test]
fn batched_removals_report_cascades() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let b = store.add_node(Position::default(), None);
    let c = store.add_node(Position::default(), None);
    store.add_edge(&a, &b).unwrap();
    let bc = store.add_edge(&b, &c).unwrap();

    let summary = store.apply_node_changes(&[NodeChange::Remove { id: a.clone() }]);
    assert_eq!(summary.removed, 2);

    let summary = store.apply_edge_changes(&[
        EdgeChange::Remove { id: bc.clone() },
        EdgeChange::Remove { id: bc },
    ]);
    assert_eq!(summary.removed, 1);
    assert!(store.edges().is_empty());
}

#[test]
fn batched_selection_changes_follow_exclusivity() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    let e = store.add_edge(&a, &a).unwrap();

    let summary = store.apply_edge_changes(&[EdgeChange::Select {
        id: e.clone(),
        selected: true,
    }]);
    assert!(!summary.altered_graph());
    assert_eq!(store.selected_edge_id(), Some(&e));

    store.apply_node_changes(&[NodeChange::Select {
        id: a.clone(),
        selected: true,
    }]);
    assert_eq!(store.selected_node_id(), Some(&a));

    store.apply_node_changes(&[NodeChange::Select {
        id: a,
        selected: false,
    }]);
    assert_eq!(store.selection(), &Selection::None);

    store.apply_node_changes(&[NodeChange::Select {
        id: "missing".into(),
        selected: true,
    }]);
    assert_eq!(store.selection(), &Selection::None);
}

#[test]
fn ids_skip_values_taken_by_loaded_documents() {
    let mut store = MindMapStore::new();
    store.load_snapshot(MindMapSnapshot {
        nodes: vec![
            NodeRecord::new("n1".into(), "A", Position::default()),
            NodeRecord::new("n2".into(), "B", Position::default()),
        ],
        edges: vec![EdgeRecord::new("e1".into(), "n1".into(), "n2".into())],
        viewport: Viewport::default(),
    });

    let id = store.add_node(Position::default(), None);
    assert_eq!(id, "n3");
    let edge = store.add_edge("n1", &id).unwrap();
    assert_eq!(edge, "e2");
    assert_eq!(ids_of(&store), vec!["n1", "n2", "n3"]);
}

#[test]
fn undo_after_load_returns_to_previous_document() {
    let mut store = MindMapStore::new();
    store.add_node(Position::default(), Some("before"));
    store.load_snapshot(MindMapSnapshot::default());
    assert!(store.nodes().is_empty());

    store.undo();
    assert_eq!(store.nodes()[0].label, "before");
}

#[test]
fn undo_clears_editing_and_selection() {
    let mut store = MindMapStore::new();
    let a = store.add_node(Position::default(), None);
    store.add_node(Position::default(), None);
    store.set_selected_node(Some(a));
    store.set_editing(true);

    store.undo();
    assert!(!store.is_editing());
    assert_eq!(store.selection(), &Selection::None);
}

#[test]
fn from_snapshot_uses_document_as_baseline() {
    let snapshot = MindMapSnapshot {
        nodes: vec![NodeRecord::new("root".into(), "Root", Position::default())],
        ..Default::default()
    };
    let store = MindMapStore::from_snapshot(snapshot.clone());
    assert_eq!(store.export_snapshot(), snapshot);
    assert!(!store.can_undo());
    assert_eq!(store.history().len(), 1);
}
