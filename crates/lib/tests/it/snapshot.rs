//! Serialize/restore round trips.

use objectsync::{AttributeType, CreateOptions, ObjectId, Snapshot, Value};

use crate::helpers::*;

/// Build a small tree with non-default values everywhere.
fn populated() -> (objectsync::Server, ObjectId) {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let pair = create(&mut server, "Pair", &folder);
    let linker = create(&mut server, "Linker", &folder);
    set(&mut server, &folder, "label", "docs");
    server
        .get_attribute(&folder, "style")
        .unwrap()
        .add(&mut server, "width", 12)
        .unwrap();
    let right = server
        .get_object(&pair)
        .unwrap()
        .child_refs()
        .get("right")
        .cloned()
        .unwrap();
    set(&mut server, &right, "count", 99);
    let target = server.get_attribute(&linker, "target").unwrap();
    target.set(&mut server, &pair).unwrap();
    (server, folder)
}

#[test]
fn test_round_trip_through_json_restores_subtree() {
    let (mut server, folder) = populated();
    let original = server.serialize(&folder).unwrap();
    let json = original.to_json().unwrap();

    server.destroy_object(&folder).unwrap();
    assert!(!server.contains(&folder));

    let decoded = Snapshot::from_json(&json).unwrap();
    assert_eq!(decoded, original);
    let info = server
        .create_object_with(
            "Folder",
            &root(),
            CreateOptions {
                snapshot: Some(decoded),
                ..CreateOptions::default()
            },
        )
        .unwrap();
    assert_eq!(info.id, folder);

    let restored = server.serialize(&folder).unwrap();
    assert_eq!(restored, original);
    for (restored_child, original_child) in restored.children.keys().zip(original.children.keys()) {
        assert_eq!(restored_child, original_child);
    }
    for id in original.descendant_ids() {
        let restored_object = server.get_object(&id).unwrap();
        let original_node = original.find(&id).unwrap();
        assert_eq!(restored_object.type_name(), original_node.type_name);
        assert_eq!(restored_object.child_refs(), &original_node.child_refs);
        assert_eq!(restored_object.attribute_refs(), &original_node.attribute_refs);
    }
}

#[test]
fn test_snapshot_records_types_and_persistence() {
    let (server, folder) = populated();
    let snapshot = server.serialize(&folder).unwrap();

    let style = snapshot.attribute("style").unwrap();
    assert_eq!(style.ty, AttributeType::Map);
    assert!(style.is_stateful);
    assert_eq!(style.value.get("width"), Some(&Value::from(12)));

    let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "Folder");
    assert_eq!(json["attributes"][0]["type"], "dict");
    assert_eq!(json["attributes"][0]["is_stateful"], true);
    assert!(json["children"].is_object());
}

#[test]
fn test_restore_skips_build() {
    let (mut server, folder) = populated();
    let pair = server.get_children_of_type(&folder, "Pair").unwrap()[0]
        .id()
        .clone();
    let extra = create(&mut server, "Counter", &pair);
    server.destroy_object(&extra).unwrap();
    let snapshot = server.serialize(&pair).unwrap();

    server.destroy_object(&pair).unwrap();
    server
        .create_object_with(
            "Pair",
            &folder,
            CreateOptions {
                snapshot: Some(snapshot.clone()),
                ..CreateOptions::default()
            },
        )
        .unwrap();

    // build would have made two fresh counters with new ids
    assert_eq!(children(&server, &pair), snapshot.children.keys().cloned().collect::<Vec<_>>());
    assert_eq!(children(&server, &pair).len(), 2);
}

#[test]
fn test_restore_rejects_mismatched_type_and_live_id() {
    let (mut server, folder) = populated();
    let snapshot = server.serialize(&folder).unwrap();

    let err = server
        .create_object_with(
            "Counter",
            &root(),
            CreateOptions {
                snapshot: Some(snapshot.clone()),
                ..CreateOptions::default()
            },
        )
        .unwrap_err();
    assert!(err.is_operation_error());

    // the subtree is still live
    let err = server
        .create_object_with(
            "Folder",
            &root(),
            CreateOptions {
                snapshot: Some(snapshot),
                ..CreateOptions::default()
            },
        )
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(children(&server, &root()), vec![folder]);
}

#[test]
fn test_event_attributes_snapshot_without_value() {
    let mut server = test_server();
    let clicker = create(&mut server, "Clicker", &root());
    let snapshot = server.serialize(&clicker).unwrap();
    let click = snapshot.attribute("click").unwrap();
    assert_eq!(click.ty, AttributeType::Event);
    assert!(click.value.is_null());
    assert!(!click.is_stateful);
}

#[test]
fn test_transient_value_is_not_snapshotted() {
    let mut server = test_server();
    let id = create(&mut server, "Folder", &root());
    let hover = server
        .add_attribute(&id, "hover", AttributeType::Generic, None, false)
        .unwrap();
    hover.set(&mut server, true).unwrap();

    let snapshot = server.serialize(&id).unwrap();
    let entry = snapshot.attribute("hover").unwrap();
    assert_eq!(entry.value, Value::Null);
    assert!(!entry.is_stateful);

    server.destroy_object(&id).unwrap();
    server.undo(None).unwrap().unwrap();
    // re-declared, but the live value is gone
    assert!(!server.get_attribute(&id, "hover").unwrap().is_stateful());
    assert_eq!(value(&server, &id, "hover"), Value::Null);
    assert_eq!(value(&server, &id, "label"), Value::from(""));
}
