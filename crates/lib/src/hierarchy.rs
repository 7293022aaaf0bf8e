//! Pure functions over the live tree: ancestor paths and lowest common ancestors.
//!
//! The functions here only need to know each node's parent, expressed by [`ParentLookup`], so
//! they can be tested against a plain map as well as run against the server's arena.

use std::collections::{HashMap, HashSet};

use crate::{ObjectId, Result, server::ServerError};

/// Resolves the parent of a node.
pub trait ParentLookup {
    /// Returns `Ok(None)` for the root, an error for an unknown node.
    fn parent_of(&self, id: &ObjectId) -> Result<Option<ObjectId>>;
}

/// Child → parent map. Nodes missing from the map are roots.
impl ParentLookup for HashMap<ObjectId, ObjectId> {
    fn parent_of(&self, id: &ObjectId) -> Result<Option<ObjectId>> {
        Ok(self.get(id).cloned())
    }
}

/// Path from the root down to `id`, both ends included.
///
/// Fails with `TreeCorruption` if walking up the parents revisits a node.
pub fn ancestors<T: ParentLookup + ?Sized>(tree: &T, id: &ObjectId) -> Result<Vec<ObjectId>> {
    let mut path = vec![id.clone()];
    let mut visited: HashSet<ObjectId> = HashSet::from([id.clone()]);
    let mut current = id.clone();
    while let Some(parent) = tree.parent_of(&current)? {
        if !visited.insert(parent.clone()) {
            return Err(ServerError::TreeCorruption {
                reason: format!("parent cycle through '{parent}' above '{id}'"),
            }
            .into());
        }
        path.push(parent.clone());
        current = parent;
    }
    path.reverse();
    Ok(path)
}

/// Deepest node shared by every root-first path.
///
/// Walks all paths in lock-step and stops at the first depth where any path disagrees with
/// the first one. Returns `None` for an empty input or when the paths do not even share a
/// root.
pub fn lowest_common_ancestor(paths: &[Vec<ObjectId>]) -> Option<ObjectId> {
    let first = paths.first()?;
    let depth = paths.iter().map(Vec::len).min()?;
    let shared = (0..depth)
        .take_while(|&i| paths.iter().all(|path| path[i] == first[i]))
        .count();
    shared.checked_sub(1).map(|i| first[i].clone())
}

/// Lowest common ancestor of a set of nodes in `tree`.
pub fn lowest_common_ancestor_of<T: ParentLookup + ?Sized>(
    tree: &T,
    ids: &[ObjectId],
) -> Result<Option<ObjectId>> {
    let paths = ids
        .iter()
        .map(|id| ancestors(tree, id))
        .collect::<Result<Vec<_>>>()?;
    Ok(lowest_common_ancestor(&paths))
}
