//! Error types for server operations.

use thiserror::Error;

/// Errors raised by the server's lifecycle, registry and dispatch operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ServerError {
    /// Create with a type name that is not registered
    #[error("Unknown object type: {type_name}")]
    UnknownType { type_name: String },

    /// No live object with this id
    #[error("Unknown object: {id}")]
    UnknownObject { id: String },

    /// Destroy of an object that is already gone
    #[error("Object already destroyed: {id}")]
    AlreadyDestroyed { id: String },

    /// Unregister while live instances exist
    #[error("Type '{type_name}' is still used by {count} live object(s)")]
    TypeInUse { type_name: String, count: usize },

    /// Register with a name or Rust type that is already registered
    #[error("Type already registered: {type_name}")]
    DuplicateTypeRegistration { type_name: String },

    /// Emit of an event nobody handles
    #[error("Unknown event: {event}")]
    UnknownEvent { event: String },

    /// Call of a service that is not registered
    #[error("Unknown service: {service}")]
    UnknownService { service: String },

    /// A request the tree cannot honor, such as destroying the root or creating a cycle
    #[error("Invalid operation '{operation}': {reason}")]
    InvalidOperation { operation: String, reason: String },

    /// A service or event payload that does not have the expected shape
    #[error("Malformed payload for '{operation}': {reason}")]
    MalformedPayload { operation: String, reason: String },

    /// A broken tree invariant
    #[error("Tree corruption: {reason}")]
    TreeCorruption { reason: String },
}

impl ServerError {
    /// Check if this error indicates a resource was not found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServerError::UnknownType { .. }
                | ServerError::UnknownObject { .. }
                | ServerError::UnknownEvent { .. }
                | ServerError::UnknownService { .. }
        )
    }

    /// Check if this error indicates a conflict with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ServerError::AlreadyDestroyed { .. }
                | ServerError::TypeInUse { .. }
                | ServerError::DuplicateTypeRegistration { .. }
        )
    }

    /// Check if this error reports a broken invariant
    pub fn is_corruption_error(&self) -> bool {
        matches!(self, ServerError::TreeCorruption { .. })
    }

    /// Check if this error is related to payload decoding
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, ServerError::MalformedPayload { .. })
    }

    /// Check if this error is a rejected operation
    pub fn is_operation_error(&self) -> bool {
        matches!(self, ServerError::InvalidOperation { .. })
    }

    pub(crate) fn invalid(operation: &str, reason: impl Into<String>) -> Self {
        ServerError::InvalidOperation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_object(id: impl std::fmt::Display) -> Self {
        ServerError::UnknownObject { id: id.to_string() }
    }
}

impl From<ServerError> for crate::Error {
    fn from(err: ServerError) -> Self {
        crate::Error::Server(err)
    }
}
