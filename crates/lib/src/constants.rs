//! Constants used throughout the objectsync library.
//!
//! This module provides central definitions for reserved topic and event names.
//! Topic names are part of the contract with remote observers and must stay bit-exact.

/// Id of the single root object.
pub const ROOT_ID: &str = "root";

/// Type name the built-in root object is registered under.
pub const ROOT_TYPE: &str = "Root";

/// Process-wide map topic of live objects (object id → type name).
pub const OBJECTS: &str = "_objects";

/// Namespace of the per-object parent topic, `parent_id/{object_id}`.
pub const PARENT_ID: &str = "parent_id";

/// Namespace of the per-object tag set topic, `tags/{object_id}`.
pub const TAGS: &str = "tags";

/// Namespace of attribute topics and per-object events, `a/{object_id}/{name}`.
pub const ATTRIBUTE: &str = "a";

/// Event that creates (or restores) an object.
pub const CREATE_OBJECT: &str = "create_object";

/// Event that destroys an object.
pub const DESTROY_OBJECT: &str = "destroy_object";

/// Service name for undoing the latest transition of a subtree.
pub const UNDO: &str = "undo";

/// Service name for redoing the latest undone transition of a subtree.
pub const REDO: &str = "redo";

/// Default number of transitions kept in each object's history.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;
