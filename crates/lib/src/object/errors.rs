//! Error types for object nodes and their attributes.

use thiserror::Error;

/// Errors raised while declaring or addressing an object's attributes and children.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ObjectError {
    /// `add_attribute` with a name the object already uses
    #[error("Object '{object}' already has an attribute named '{name}'")]
    DuplicateAttribute { object: String, name: String },

    /// No attribute with this name on the object
    #[error("Attribute '{name}' not found on object '{object}'")]
    AttributeNotFound { object: String, name: String },

    /// Two children registering under the same id
    #[error("Object '{child}' is already registered under '{parent}'")]
    DuplicateChild { parent: String, child: String },

    /// Operation does not fit the attribute's declared type
    #[error("Attribute '{name}' on object '{object}' has type {actual}, expected {expected}")]
    InvalidAttributeType {
        object: String,
        name: String,
        expected: String,
        actual: String,
    },

    /// A reference that does not resolve to a live object
    #[error("Reference '{field}' on object '{object}' does not resolve: {target}")]
    UnresolvedReference {
        object: String,
        field: String,
        target: String,
    },
}

impl ObjectError {
    /// Check if this error indicates a resource was not found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ObjectError::AttributeNotFound { .. } | ObjectError::UnresolvedReference { .. }
        )
    }

    /// Check if this error indicates something already exists
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            ObjectError::DuplicateAttribute { .. } | ObjectError::DuplicateChild { .. }
        )
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, ObjectError::InvalidAttributeType { .. })
    }

    /// Get the object id associated with this error
    pub fn object(&self) -> &str {
        match self {
            ObjectError::DuplicateAttribute { object, .. }
            | ObjectError::AttributeNotFound { object, .. }
            | ObjectError::InvalidAttributeType { object, .. }
            | ObjectError::UnresolvedReference { object, .. } => object,
            ObjectError::DuplicateChild { parent, .. } => parent,
        }
    }
}

impl From<ObjectError> for crate::Error {
    fn from(err: ObjectError) -> Self {
        crate::Error::Object(err)
    }
}
