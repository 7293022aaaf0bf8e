//!
//! objectsync: a tree of synchronized, versioned objects shared between a server and its clients.
//! This library provides the engine that keeps that tree consistent under transactional edits.
//!
//! ## Core Concepts
//!
//! objectsync is built around several key concepts:
//!
//! * **Topics (`topic::TopicStore`)**: Named, typed, observable value cells. Every piece of
//!   replicated state (attribute values, parent links, tags) lives in a topic.
//! * **Changes and Transitions (`topic::Change`, `topic::Transition`)**: Every topic mutation
//!   produces an invertible change. Changes are grouped into transitions, the unit of undo/redo.
//! * **Objects (`object::SObject`)**: Tree nodes owning a set of attribute topics, an ordered
//!   list of children and a bounded undo/redo `history::History`.
//! * **Object types (`object::ObjectType`)**: Registered behaviors that declare attributes and
//!   children when an object is first built.
//! * **Server (`server::Server`)**: Owns the object arena, the type registry and the topic store.
//!   It drives create/destroy as invertible events and routes every finished transition to the
//!   histories of the affected subtree and all of its ancestors.
//! * **Snapshots (`snapshot::Snapshot`)**: The recursive serialized form of a subtree. Destroying
//!   an object yields its snapshot, and creating from a snapshot restores it losslessly.

pub mod clock;
pub mod constants;
pub mod hierarchy;
pub mod history;
pub mod id;
pub mod object;
pub mod server;
pub mod snapshot;
pub mod topic;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use id::ObjectId;
pub use object::{Attribute, AttributeType, BuildContext, ObjAttribute, ObjectType, SObject};
pub use server::{CreateInfo, CreateOptions, DestroyInfo, Recording, Server, ServerConfig};
pub use snapshot::Snapshot;
pub use topic::{Change, Direction, EventKey, Mutation, TopicKey, Transition, Value};

/// Result type used throughout the objectsync library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the objectsync library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured topic store errors from the topic module
    #[error(transparent)]
    Topic(topic::TopicError),

    /// Structured object errors from the object module
    #[error(transparent)]
    Object(object::ObjectError),

    /// Structured server errors from the server module
    #[error(transparent)]
    Server(server::ServerError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Topic(_) => "topic",
            Error::Object(_) => "object",
            Error::Server(_) => "server",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Topic(topic_err) => topic_err.is_not_found(),
            Error::Object(object_err) => object_err.is_not_found(),
            Error::Server(server_err) => server_err.is_not_found(),
            Error::Serialize(_) => false,
        }
    }

    /// Check if this error indicates a conflict (something already exists or is in use).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Topic(topic_err) => topic_err.is_already_exists(),
            Error::Object(object_err) => object_err.is_already_exists(),
            Error::Server(server_err) => server_err.is_conflict(),
            Error::Serialize(_) => false,
        }
    }

    /// Check if this error is a value/type mismatch.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Topic(topic_err) => topic_err.is_type_error(),
            Error::Object(object_err) => object_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error reports a broken tree invariant rather than a caller mistake.
    pub fn is_corruption_error(&self) -> bool {
        match self {
            Error::Server(server_err) => server_err.is_corruption_error(),
            _ => false,
        }
    }

    /// Check if the server refused the operation, such as destroying the root.
    pub fn is_operation_error(&self) -> bool {
        match self {
            Error::Server(server_err) => server_err.is_operation_error(),
            _ => false,
        }
    }

    /// Check if this error is serialization-related.
    pub fn is_serialization_error(&self) -> bool {
        match self {
            Error::Serialize(_) => true,
            Error::Server(server_err) => server_err.is_serialization_error(),
            _ => false,
        }
    }
}
