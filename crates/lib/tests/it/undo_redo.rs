//! Undo and redo through the server.

use std::cell::RefCell;
use std::rc::Rc;

use objectsync::{CreateOptions, Direction, ObjectId, ServerConfig, Value};

use crate::helpers::*;

#[test]
fn test_undo_on_empty_history_is_noop() {
    let mut server = test_server();
    assert_eq!(server.undo(None).unwrap(), None);
    assert_eq!(server.redo(None).unwrap(), None);
    assert!(!server.can_undo(None).unwrap());
}

#[test]
fn test_undo_create_then_redo_recreates_same_object() {
    let mut server = test_server();
    let before = children(&server, &root());
    let info = server
        .create_object_with(
            "Counter",
            &root(),
            CreateOptions {
                args: Value::map([("count", 3)]),
                ..CreateOptions::default()
            },
        )
        .unwrap();

    let undone = server.undo(None).unwrap().expect("create should be undoable");
    assert_eq!(undone.len(), 1);
    assert!(!server.contains(&info.id));
    assert_eq!(children(&server, &root()), before);

    server.redo(None).unwrap().expect("create should be redoable");
    let object = server.get_object(&info.id).expect("object recreated");
    assert_eq!(object.type_name(), "Counter");
    assert_eq!(server.parent_of(&info.id).unwrap(), Some(root()));
    assert_eq!(value(&server, &info.id, "count"), Value::from(3));
    assert_eq!(server.serialize(&info.id).unwrap(), info.snapshot);
}

#[test]
fn test_undo_redo_attribute_change() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    set(&mut server, &id, "count", 5);
    set(&mut server, &id, "count", 6);

    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "count"), Value::from(5));
    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "count"), Value::from(0));
    assert_eq!(server.undo(Some(&id)).unwrap(), None);

    server.redo(Some(&id)).unwrap().unwrap();
    server.redo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "count"), Value::from(6));
    assert_eq!(server.redo(Some(&id)).unwrap(), None);
}

#[test]
fn test_undo_destroy_restores_subtree_exactly() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let pair = create(&mut server, "Pair", &folder);
    let extra = create(&mut server, "Counter", &pair);
    let kids = children(&server, &pair);
    set(&mut server, &kids[0], "count", 42);
    set(&mut server, &extra, "count", 9);
    server
        .get_attribute(&folder, "style")
        .unwrap()
        .add(&mut server, "color", "red")
        .unwrap();
    let before = server.serialize(&folder).unwrap();

    server.destroy_object(&folder).unwrap();
    assert!(!server.contains(&pair));

    server.undo(None).unwrap().expect("destroy should be undoable");
    let after = server.serialize(&folder).unwrap();
    assert_eq!(after, before);
    assert_eq!(children(&server, &pair), kids);
    assert_eq!(value(&server, &kids[0], "count"), Value::from(42));
    assert_eq!(
        server.get_object(&pair).unwrap().child_refs().get("left"),
        Some(&kids[0])
    );
    assert_eq!(children(&server, &root()), vec![folder.clone()]);

    server.redo(None).unwrap().expect("destroy should be redoable");
    assert!(!server.contains(&folder));
    assert!(!server.contains(&extra));
}

#[test]
fn test_chained_undo_of_nested_creates() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let counter = create(&mut server, "Counter", &folder);
    server.destroy_object(&folder).unwrap();

    server.undo(None).unwrap().unwrap();
    assert!(server.contains(&counter));
    server.undo(None).unwrap().unwrap();
    assert!(!server.contains(&counter));
    assert!(server.contains(&folder));
    server.undo(None).unwrap().unwrap();
    assert!(!server.contains(&folder));
    assert_eq!(server.undo(None).unwrap(), None);

    for _ in 0..3 {
        server.redo(None).unwrap().unwrap();
    }
    assert!(!server.contains(&folder));
    assert!(!server.contains(&counter));
    assert_eq!(server.redo(None).unwrap(), None);
}

#[test]
fn test_new_transition_discards_redo_tail() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    set(&mut server, &id, "count", 1);
    set(&mut server, &id, "count", 2);

    server.undo(None).unwrap().unwrap();
    set(&mut server, &id, "count", 5);
    assert_eq!(server.redo(None).unwrap(), None);
    // create, count=1, count=5
    assert_eq!(history_len(&server, &root()), 3);
}

#[test]
fn test_recording_groups_operations() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());

    let mut recording = server.record();
    let counter = recording.create_object("Counter", &folder).unwrap();
    let count = recording.get_attribute(&counter, "count").unwrap();
    count.set(&mut recording, 4).unwrap();
    let label = recording.get_attribute(&folder, "label").unwrap();
    label.set(&mut recording, "grouped").unwrap();
    recording.finish().unwrap();

    assert_eq!(history_len(&server, &root()), 2);
    let undone = server.undo(None).unwrap().unwrap();
    assert_eq!(undone.len(), 3);
    assert!(!server.contains(&counter));
    assert_eq!(value(&server, &folder, "label"), Value::from(""));
}

#[test]
fn test_recording_finishes_on_drop() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    {
        let mut recording = server.record();
        set(&mut recording, &id, "count", 1);
        set(&mut recording, &id, "count", 2);
    }
    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "count"), Value::from(0));
}

#[test]
fn test_undo_through_root_then_subtree_never_double_applies() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let counter = create(&mut server, "Counter", &folder);
    set(&mut server, &counter, "count", 1);

    server.undo(None).unwrap().unwrap();
    assert_eq!(value(&server, &counter, "count"), Value::from(0));

    // the same item, already undone through the root
    assert_eq!(server.undo(Some(&counter)).unwrap(), None);
    assert_eq!(value(&server, &counter, "count"), Value::from(0));

    // folder's chain skips it and undoes the counter's creation instead
    server.undo(Some(&folder)).unwrap().unwrap();
    assert!(!server.contains(&counter));
}

#[test]
fn test_undo_unknown_target_fails() {
    let mut server = test_server();
    let err = server.undo(Some(&ObjectId::new("ghost"))).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_undo_reparent() {
    let mut server = test_server();
    let p1 = create(&mut server, "Folder", &root());
    let p2 = create(&mut server, "Folder", &root());
    let x = create(&mut server, "Counter", &p1);
    server.set_parent(&x, &p2).unwrap();

    server.undo(None).unwrap().unwrap();
    assert_eq!(children(&server, &p1), vec![x.clone()]);
    assert!(children(&server, &p2).is_empty());

    server.redo(None).unwrap().unwrap();
    assert_eq!(children(&server, &p2), vec![x.clone()]);
    assert_eq!(server.parent_of(&x).unwrap(), Some(p2));
}

#[test]
fn test_undo_and_redo_services() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    set(&mut server, &id, "count", 8);

    let undone = server
        .call_service("undo", Value::map([("target", &id)]))
        .unwrap();
    assert!(undone.get("changes").is_some());
    assert_eq!(value(&server, &id, "count"), Value::from(0));

    let nothing = server.call_service("undo", Value::map([("target", &id)])).unwrap();
    assert!(nothing.is_null());

    server.call_service("redo", Value::Null).unwrap();
    assert_eq!(value(&server, &id, "count"), Value::from(0));
    server.call_service("redo", Value::map([("target", &id)])).unwrap();
    assert_eq!(value(&server, &id, "count"), Value::from(8));
}

#[test]
fn test_transition_callbacks_see_direction() {
    let mut server = test_server();
    let seen: Rc<RefCell<Vec<(u64, Direction)>>> = Rc::default();
    let sink = Rc::clone(&seen);
    server.on_transition(move |_, transition, direction| {
        sink.borrow_mut().push((transition.id, direction));
    });

    let id = create(&mut server, "Counter", &root());
    set(&mut server, &id, "count", 1);
    server.undo(None).unwrap();
    server.redo(None).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[2], (seen[1].0, Direction::Backward));
    assert_eq!(seen[3], (seen[1].0, Direction::Forward));
}

#[test]
fn test_history_depth_limit() {
    let mut server = test_server_with(ServerConfig::default().with_history_depth(3));
    let id = create(&mut server, "Counter", &root());
    for n in 1..=5 {
        set(&mut server, &id, "count", n);
    }

    let history = server.history(&id).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.cursor(), 3);
    let latest = history.current().unwrap().transition();
    assert_eq!(latest.id, history.iter().last().unwrap().transition().id);

    for _ in 0..3 {
        server.undo(Some(&id)).unwrap().unwrap();
    }
    assert_eq!(server.undo(Some(&id)).unwrap(), None);
    assert_eq!(value(&server, &id, "count"), Value::from(2));
}

#[test]
fn test_undo_destroy_keeps_live_child_order() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let first = create(&mut server, "Counter", &folder);
    let second = create(&mut server, "Counter", &folder);
    // moving `first` out and back puts it last, against id order
    server.set_parent(&first, &root()).unwrap();
    server.set_parent(&first, &folder).unwrap();
    let live = vec![second.clone(), first.clone()];
    assert_eq!(children(&server, &folder), live);

    server.destroy_object(&folder).unwrap();
    server.undo(None).unwrap().unwrap();
    assert_eq!(children(&server, &folder), live);
    let snapshot = server.serialize(&folder).unwrap();
    assert_eq!(snapshot.children.keys().cloned().collect::<Vec<_>>(), live);

    server.redo(None).unwrap().unwrap();
    server.undo(None).unwrap().unwrap();
    assert_eq!(children(&server, &folder), live);
}

#[test]
fn test_undo_reparent_restores_position() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let other = create(&mut server, "Folder", &root());
    let kids: Vec<ObjectId> = (0..3).map(|_| create(&mut server, "Counter", &folder)).collect();

    server.set_parent(&kids[0], &other).unwrap();
    assert_eq!(children(&server, &folder), kids[1..].to_vec());

    server.undo(None).unwrap().unwrap();
    assert_eq!(children(&server, &folder), kids);
    server.redo(None).unwrap().unwrap();
    assert_eq!(children(&server, &other), vec![kids[0].clone()]);
    server.undo(None).unwrap().unwrap();
    assert_eq!(children(&server, &folder), kids);
}

#[test]
fn test_undo_destroy_restores_sibling_position() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let kids: Vec<ObjectId> = (0..3).map(|_| create(&mut server, "Counter", &folder)).collect();

    server.destroy_object(&kids[1]).unwrap();
    assert_eq!(children(&server, &folder), vec![kids[0].clone(), kids[2].clone()]);
    server.undo(None).unwrap().unwrap();
    assert_eq!(children(&server, &folder), kids);
}

#[test]
fn test_failed_undo_leaves_history_in_place() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    set(&mut server, &id, "count", 5);
    server.remove_attribute(&id, "count").unwrap();

    let err = server.undo(Some(&id)).unwrap_err();
    assert!(err.is_not_found());
    assert!(server.can_undo(Some(&id)).unwrap());
    assert!(!server.can_redo(Some(&id)).unwrap());
    assert!(server.history(&id).unwrap().current().unwrap().is_done());

    // still the same item, failing the same way
    assert!(server.undo(Some(&id)).unwrap_err().is_not_found());
}

#[test]
fn test_failed_undo_rolls_back_partial_replay() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let counter = create(&mut server, "Counter", &root());
    {
        let mut recording = server.record();
        set(&mut recording, &counter, "count", 5);
        set(&mut recording, &folder, "label", "kept");
    }
    server.remove_attribute(&counter, "count").unwrap();
    let cursor = server.history(&root()).unwrap().cursor();

    // the label is reverted first, then the count fails
    assert!(server.undo(None).is_err());
    assert_eq!(value(&server, &folder, "label"), Value::from("kept"));
    assert_eq!(server.history(&root()).unwrap().cursor(), cursor);
    assert!(server.can_undo(None).unwrap());
    assert!(!server.can_redo(None).unwrap());
}
