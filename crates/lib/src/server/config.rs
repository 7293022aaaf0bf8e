//! Server configuration.

use serde::{Deserialize, Serialize};

use crate::{Result, history::HistoryConfig};

/// Configuration for a [`Server`](super::Server).
///
/// Every field has a default, so an empty JSON object is a valid configuration.
///
/// ```
/// use objectsync::ServerConfig;
///
/// let config = ServerConfig::from_json_str(r#"{ "history": { "max_depth": 5 } }"#).unwrap();
/// assert_eq!(config.history.max_depth, 5);
///
/// let config = ServerConfig::from_json_str("{}").unwrap();
/// assert_eq!(config.history.max_depth, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Limits applied to every object's undo/redo history.
    #[serde(default)]
    pub history: HistoryConfig,
}

impl ServerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the per-object history depth.
    pub fn with_history_depth(mut self, max_depth: usize) -> Self {
        self.history.max_depth = max_depth;
        self
    }
}
