//! Which histories record a transition.

use std::cell::Cell;
use std::rc::Rc;

use objectsync::{Mutation, ObjectId, TopicKey, Value, topic::TopicKind};

use crate::helpers::*;

#[test]
fn test_attribute_change_recorded_at_owner_and_ancestors() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let counter = create(&mut server, "Counter", &folder);
    set(&mut server, &counter, "count", 1);

    assert_eq!(history_len(&server, &counter), 1);
    // creation of the counter plus the change
    assert_eq!(history_len(&server, &folder), 2);
    assert_eq!(history_len(&server, &root()), 3);

    // one shared item in every chain
    let item = |id: &ObjectId| {
        server
            .history(id)
            .unwrap()
            .current()
            .map(|item| item.transition().id)
    };
    assert_eq!(item(&counter), item(&folder));
    assert_eq!(item(&folder), item(&root()));
}

#[test]
fn test_disjoint_subtrees_keep_separate_cursors() {
    let mut server = test_server();
    let a = create(&mut server, "Counter", &root());
    let b = create(&mut server, "Counter", &root());
    set(&mut server, &a, "count", 1);
    set(&mut server, &b, "count", 2);

    let b_cursor = server.history(&b).unwrap().cursor();
    server.undo(Some(&a)).unwrap().unwrap();

    assert_eq!(server.history(&b).unwrap().cursor(), b_cursor);
    assert_eq!(value(&server, &b, "count"), Value::from(2));
    assert_eq!(value(&server, &a, "count"), Value::from(0));
    assert!(server.history(&b).unwrap().can_undo());
}

#[test]
fn test_reparent_recorded_at_lowest_common_ancestor_only() {
    let mut server = test_server();
    let p1 = create(&mut server, "Folder", &root());
    let p2 = create(&mut server, "Folder", &root());
    let x = create(&mut server, "Counter", &p1);
    let p1_before = history_len(&server, &p1);
    let root_before = history_len(&server, &root());

    server.set_parent(&x, &p2).unwrap();

    assert_eq!(history_len(&server, &root()), root_before + 1);
    assert_eq!(history_len(&server, &p1), p1_before);
    assert_eq!(history_len(&server, &p2), 0);
    assert_eq!(history_len(&server, &x), 0);
}

#[test]
fn test_reparent_within_subtree_recorded_at_subtree() {
    let mut server = test_server();
    let top = create(&mut server, "Folder", &root());
    let p1 = create(&mut server, "Folder", &top);
    let p2 = create(&mut server, "Folder", &top);
    let x = create(&mut server, "Counter", &p1);
    let top_before = history_len(&server, &top);

    server.set_parent(&x, &p2).unwrap();
    assert_eq!(history_len(&server, &top), top_before + 1);
    assert_eq!(history_len(&server, &p2), 0);
}

#[test]
fn test_create_and_destroy_recorded_at_parent() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let counter = create(&mut server, "Counter", &folder);
    assert_eq!(history_len(&server, &folder), 1);

    server.destroy_object(&counter).unwrap();
    assert_eq!(history_len(&server, &folder), 2);
    assert_eq!(history_len(&server, &root()), 3);
}

#[test]
fn test_transition_spanning_siblings_recorded_at_parent() {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let a = create(&mut server, "Counter", &folder);
    let b = create(&mut server, "Counter", &folder);

    server
        .with_record(|server| {
            server.get_attribute(&a, "count")?.set(server, 1)?;
            server.get_attribute(&b, "count")?.set(server, 2)
        })
        .unwrap();

    assert_eq!(history_len(&server, &a), 0);
    assert_eq!(history_len(&server, &b), 0);
    assert_eq!(history_len(&server, &folder), 3);
    server.undo(Some(&folder)).unwrap().unwrap();
    assert_eq!(value(&server, &a, "count"), Value::from(0));
    assert_eq!(value(&server, &b, "count"), Value::from(0));
}

#[test]
fn test_tags_are_not_recorded() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    server.add_tag(&id, "pinned").unwrap();
    server.add_tag(&id, "pinned").unwrap();

    assert_eq!(server.tags(&id).unwrap(), vec!["pinned".to_string()]);
    assert!(server.has_tag(&id, "pinned").unwrap());
    assert_eq!(history_len(&server, &id), 0);
    assert!(!server.serialize(&id).unwrap().to_json().unwrap().contains("pinned"));

    server.remove_tag(&id, "pinned").unwrap();
    assert!(server.tags(&id).unwrap().is_empty());
}

#[test]
fn test_unowned_topic_change_not_recorded() {
    let mut server = test_server();
    let key = TopicKey::Named("presence".to_string());
    server
        .add_topic(key.clone(), TopicKind::Map, None, true)
        .unwrap();
    let routed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&routed);
    server.on_transition(move |_, _, _| counter.set(counter.get() + 1));

    let change = server
        .mutate(
            &key,
            Mutation::Add {
                key: "alice".to_string(),
                value: Value::from("online"),
            },
        )
        .unwrap();

    assert!(change.is_some());
    assert_eq!(routed.get(), 1);
    assert!(server.history(&root()).unwrap().is_empty());
}

#[test]
fn test_owned_topics_cannot_be_added_directly() {
    let mut server = test_server();
    let err = server
        .add_topic(TopicKey::ParentId(root()), TopicKind::String, None, true)
        .unwrap_err();
    assert!(err.is_operation_error());
}
