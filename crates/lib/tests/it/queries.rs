//! Tree queries and the hierarchy helpers over a live server.

use objectsync::{ObjectId, hierarchy};

use crate::helpers::*;

/// root ── folder ─┬─ pair ─┬─ left
///                 │        └─ right
///                 ├─ inner ── deep (Counter)
///                 └─ counter
fn tree() -> (objectsync::Server, ObjectId, ObjectId, ObjectId, ObjectId) {
    let mut server = test_server();
    let folder = create(&mut server, "Folder", &root());
    let pair = create(&mut server, "Pair", &folder);
    let inner = create(&mut server, "Folder", &folder);
    let deep = create(&mut server, "Counter", &inner);
    create(&mut server, "Counter", &folder);
    (server, folder, pair, inner, deep)
}

#[test]
fn test_children_of_type_keeps_order() {
    let (server, folder, pair, inner, _) = tree();
    let folders: Vec<&ObjectId> = server
        .get_children_of_type(&folder, "Folder")
        .unwrap()
        .into_iter()
        .map(|object| object.id())
        .collect();
    assert_eq!(folders, vec![&inner]);

    let counters = server.get_children_of_type(&pair, "Counter").unwrap();
    assert_eq!(counters.len(), 2);
    assert!(server.get_children_of_type(&pair, "Pair").unwrap().is_empty());
}

#[test]
fn test_child_by_id_only_finds_direct_children() {
    let (server, folder, pair, _, deep) = tree();
    assert_eq!(
        server.get_child_by_id(&folder, &pair).unwrap().map(|o| o.id()),
        Some(&pair)
    );
    assert!(server.get_child_by_id(&folder, &deep).unwrap().is_none());
    assert!(server.get_child_by_id(&ObjectId::new("ghost"), &pair).is_err());
}

#[test]
fn test_top_down_search_visits_pre_order() {
    let (server, folder, pair, inner, deep) = tree();
    let counters: Vec<ObjectId> = server
        .top_down_search(&root(), |o| o.type_name() == "Counter", |_| false)
        .unwrap()
        .into_iter()
        .map(|o| o.id().clone())
        .collect();
    let pair_kids = children(&server, &pair);
    let last = children(&server, &folder)[2].clone();
    assert_eq!(
        counters,
        vec![pair_kids[0].clone(), pair_kids[1].clone(), deep.clone(), last]
    );

    // the start node itself is never returned
    let folders = server
        .top_down_search(&folder, |o| o.type_name() == "Folder", |_| false)
        .unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].id(), &inner);
}

#[test]
fn test_top_down_search_stops_descending() {
    let (server, folder, pair, inner, deep) = tree();
    let found: Vec<ObjectId> = server
        .top_down_search(&folder, |_| true, |o| o.type_name() == "Pair" || o.id() == &inner)
        .unwrap()
        .into_iter()
        .map(|o| o.id().clone())
        .collect();

    // stop nodes are visited but their subtrees are not
    assert!(found.contains(&pair));
    assert!(found.contains(&inner));
    assert!(!found.contains(&deep));
    assert_eq!(found.len(), 3);
}

#[test]
fn test_ancestors_and_lca_over_server() {
    let (server, folder, pair, inner, deep) = tree();
    assert_eq!(
        server.ancestors(&deep).unwrap(),
        vec![root(), folder.clone(), inner.clone(), deep.clone()]
    );
    assert_eq!(server.ancestors(&root()).unwrap(), vec![root()]);

    let left = children(&server, &pair)[0].clone();
    assert_eq!(
        hierarchy::lowest_common_ancestor_of(&server, &[left.clone(), deep.clone()]).unwrap(),
        Some(folder.clone())
    );
    assert_eq!(
        hierarchy::lowest_common_ancestor_of(&server, &[deep.clone(), inner.clone()]).unwrap(),
        Some(inner)
    );
    assert_eq!(
        hierarchy::lowest_common_ancestor_of(&server, &[left.clone()]).unwrap(),
        Some(left)
    );

    let err = server.ancestors(&ObjectId::new("ghost")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_parent_of_root_and_unknown() {
    let (server, folder, ..) = tree();
    assert_eq!(server.parent_of(&root()).unwrap(), None);
    assert_eq!(server.parent_of(&folder).unwrap(), Some(root()));
    assert!(server.parent_of(&ObjectId::new("ghost")).unwrap_err().is_not_found());
}

#[test]
fn test_get_objects_sorted_by_id() {
    let (server, ..) = tree();
    let ids: Vec<&ObjectId> = server.get_objects().into_iter().map(|o| o.id()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(ids.len(), server.object_count());
    // root, folder, pair + two counters, inner, deep, counter
    assert_eq!(server.object_count(), 8);
    assert!(server.root().unwrap().is_root());
}
