//! Attribute declaration, mutation and observers.

use std::cell::RefCell;
use std::rc::Rc;

use objectsync::{AttributeType, Change, Value};

use crate::helpers::*;

#[test]
fn test_add_attribute_at_runtime() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());

    let items = server
        .add_attribute(&id, "items", AttributeType::List, None, true)
        .expect("Failed to add attribute");
    assert_eq!(items.ty(), AttributeType::List);
    assert!(server.has_attribute(&id, "items").unwrap());
    assert_eq!(value(&server, &id, "items"), Value::List(vec![]));
    assert_eq!(value(&server, &id, "style"), Value::Map(Default::default()));
    assert_eq!(value(&server, &id, "label"), Value::from(""));
}

#[test]
fn test_duplicate_and_empty_attribute_names_rejected() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());

    let err = server
        .add_attribute(&id, "label", AttributeType::Int, None, true)
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(server.get_attribute(&id, "label").unwrap().ty(), AttributeType::String);

    let err = server
        .add_attribute(&id, "", AttributeType::Int, None, true)
        .unwrap_err();
    assert!(err.is_operation_error());

    let err = server.get_attribute(&id, "missing").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_set_checks_type() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    let count = server.get_attribute(&id, "count").unwrap();

    let err = count.set(&mut server, "seven").unwrap_err();
    assert!(err.is_type_error());
    let err = count.append(&mut server, 1).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(value(&server, &id, "count"), Value::from(0));
    assert!(server.history(&id).unwrap().is_empty());
}

#[test]
fn test_list_mutators_undo_in_reverse() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let items = server
        .add_attribute(&id, "items", AttributeType::List, None, true)
        .unwrap();

    items.append(&mut server, "a").unwrap();
    items.append(&mut server, "c").unwrap();
    items.insert(&mut server, 1, "b").unwrap();
    assert_eq!(value(&server, &id, "items"), Value::from(vec!["a", "b", "c"]));

    let popped = items.pop(&mut server, Some(0)).unwrap();
    assert_eq!(popped, Value::from("a"));
    items.remove(&mut server, "c").unwrap();
    assert_eq!(value(&server, &id, "items"), Value::from(vec!["b"]));

    let err = items.insert(&mut server, 5, "z").unwrap_err();
    assert!(!err.is_type_error());
    let err = items.remove(&mut server, "nope").unwrap_err();
    assert!(err.is_not_found());

    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "items"), Value::from(vec!["b", "c"]));
    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "items"), Value::from(vec!["a", "b", "c"]));
    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(value(&server, &id, "items"), Value::from(vec!["a", "c"]));
}

#[test]
fn test_set_attribute_ignores_duplicates() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let members = server
        .add_attribute(&id, "members", AttributeType::Set, None, true)
        .unwrap();

    members.append(&mut server, "x").unwrap();
    members.append(&mut server, "x").unwrap();
    assert_eq!(value(&server, &id, "members"), Value::from(vec!["x"]));
    assert_eq!(history_len(&server, &id), 1);

    let err = members.set(&mut server, vec!["y", "y"]).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_dict_mutators() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let style = server.get_attribute(&id, "style").unwrap();

    style.add(&mut server, "color", "red").unwrap();
    let err = style.add(&mut server, "color", "blue").unwrap_err();
    assert!(err.is_conflict());

    style.change_value(&mut server, "color", "blue").unwrap();
    assert_eq!(
        value(&server, &id, "style").get("color"),
        Some(&Value::from("blue"))
    );
    let removed = style.delete(&mut server, "color").unwrap();
    assert_eq!(removed, Value::from("blue"));
    let err = style.delete(&mut server, "color").unwrap_err();
    assert!(err.is_not_found());

    server.undo(Some(&id)).unwrap().unwrap();
    server.undo(Some(&id)).unwrap().unwrap();
    assert_eq!(
        value(&server, &id, "style").get("color"),
        Some(&Value::from("red"))
    );
}

#[test]
fn test_setting_equal_value_is_not_recorded() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    set(&mut server, &id, "count", 3);
    set(&mut server, &id, "count", 3);
    assert_eq!(history_len(&server, &id), 1);
}

#[test]
fn test_transient_attribute_is_not_recorded() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let hover = server
        .add_attribute(&id, "hover", AttributeType::Generic, None, false)
        .unwrap();
    hover.set(&mut server, true).unwrap();

    assert_eq!(value(&server, &id, "hover"), Value::from(true));
    assert_eq!(history_len(&server, &id), 0);
    assert!(!server.serialize(&id).unwrap().attribute("hover").unwrap().is_stateful);
}

#[test]
fn test_observers_see_changes_and_replays() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    let count = server.get_attribute(&id, "count").unwrap();
    let seen: Rc<RefCell<Vec<(Value, Value)>>> = Rc::default();
    let sink = Rc::clone(&seen);
    count
        .observe(&mut server, move |_, change| {
            if let Change::Set { old, new, .. } = change {
                sink.borrow_mut().push((old.clone(), new.clone()));
            }
        })
        .unwrap();

    count.set(&mut server, 1).unwrap();
    server.undo(Some(&id)).unwrap().unwrap();
    server.redo(Some(&id)).unwrap().unwrap();

    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec![
            (Value::from(0), Value::from(1)),
            (Value::from(1), Value::from(0)),
            (Value::from(0), Value::from(1)),
        ]
    );
}

#[test]
fn test_observer_reads_current_state() {
    let mut server = test_server();
    let id = create(&mut server, "Counter", &root());
    let count = server.get_attribute(&id, "count").unwrap();
    let observed = Rc::new(RefCell::new(Value::Null));
    let sink = Rc::clone(&observed);
    let read = count.clone();
    count
        .observe(&mut server, move |server, _| {
            *sink.borrow_mut() = read.get(server).cloned().unwrap_or_default();
        })
        .unwrap();

    count.set(&mut server, 12).unwrap();
    assert_eq!(*observed.borrow(), Value::from(12));
}

#[test]
fn test_remove_attribute_drops_topic_and_observers() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let label = server.get_attribute(&id, "label").unwrap();
    label.observe(&mut server, |_, _| {}).unwrap();

    let removed = server.remove_attribute(&id, "label").unwrap();
    assert_eq!(removed.name(), "label");
    assert!(!server.has_attribute(&id, "label").unwrap());
    assert!(!server.topics().contains(&removed.key()));

    let err = label.set(&mut server, "gone").unwrap_err();
    assert!(err.is_not_found());
    let err = server.remove_attribute(&id, "label").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_get_as_deserializes() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let style = server.get_attribute(&id, "style").unwrap();
    style.add(&mut server, "width", 3).unwrap();
    style.add(&mut server, "height", 4).unwrap();

    let parsed: std::collections::BTreeMap<String, i64> = style.get_as(&server).unwrap();
    assert_eq!(parsed["width"] * parsed["height"], 12);
}

#[test]
fn test_dict_keeps_insertion_order_through_undo() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let style = server.get_attribute(&id, "style").unwrap();
    for key in ["width", "color", "align"] {
        style.add(&mut server, key, 1).unwrap();
    }
    let keys = |server: &objectsync::Server| -> Vec<String> {
        value(server, &id, "style").as_map().unwrap().keys().cloned().collect()
    };
    assert_eq!(keys(&server), vec!["width", "color", "align"]);

    server.destroy_object(&id).unwrap();
    server.undo(None).unwrap().unwrap();
    assert_eq!(keys(&server), vec!["width", "color", "align"]);
}
