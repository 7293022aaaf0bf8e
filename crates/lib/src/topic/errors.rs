//! Error types for topic store operations.

use thiserror::Error;

/// Errors raised by the in-process topic store.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TopicError {
    /// No topic is registered under this name
    #[error("Topic not found: {topic}")]
    TopicNotFound { topic: String },

    /// A topic with this name already exists
    #[error("Topic already exists: {topic}")]
    TopicExists { topic: String },

    /// The value or operation does not fit the topic's kind
    #[error("Type mismatch on topic '{topic}': expected {expected}, found {actual}")]
    TypeMismatch {
        topic: String,
        expected: String,
        actual: String,
    },

    /// Sequence index outside the current length
    #[error("Index {index} out of range for topic '{topic}' of length {len}")]
    IndexOutOfRange {
        topic: String,
        index: usize,
        len: usize,
    },

    /// Removing an element that the sequence does not contain
    #[error("Value {value} not found in topic '{topic}'")]
    ValueNotFound { topic: String, value: String },

    /// Map key missing
    #[error("Key '{key}' not found in topic '{topic}'")]
    KeyNotFound { topic: String, key: String },

    /// Map key already present on add
    #[error("Key '{key}' already exists in topic '{topic}'")]
    KeyExists { topic: String, key: String },

    /// A wire name that does not parse into a topic or event key
    #[error("Invalid topic name: '{name}'")]
    InvalidTopicName { name: String },
}

impl TopicError {
    /// Check if this error indicates a resource was not found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TopicError::TopicNotFound { .. }
                | TopicError::ValueNotFound { .. }
                | TopicError::KeyNotFound { .. }
        )
    }

    /// Check if this error indicates something already exists
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            TopicError::TopicExists { .. } | TopicError::KeyExists { .. }
        )
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, TopicError::TypeMismatch { .. })
    }

    /// Get the topic name associated with this error
    pub fn topic(&self) -> &str {
        match self {
            TopicError::TopicNotFound { topic }
            | TopicError::TopicExists { topic }
            | TopicError::TypeMismatch { topic, .. }
            | TopicError::IndexOutOfRange { topic, .. }
            | TopicError::ValueNotFound { topic, .. }
            | TopicError::KeyNotFound { topic, .. }
            | TopicError::KeyExists { topic, .. } => topic,
            TopicError::InvalidTopicName { name } => name,
        }
    }
}

impl From<TopicError> for crate::Error {
    fn from(err: TopicError) -> Self {
        crate::Error::Topic(err)
    }
}
