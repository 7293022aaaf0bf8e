//! Topic type tags.

use serde::{Deserialize, Serialize};

use super::Value;

/// The closed set of topic types.
///
/// Serialized with the same tags remote clients use: `int`, `float`, `string`, `generic`,
/// `list`, `set`, `dict`, `event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    Int,
    Float,
    String,
    /// Any value
    Generic,
    /// Ordered sequence
    List,
    /// Sequence of unique values, kept in insertion order
    Set,
    /// String-keyed map
    #[serde(rename = "dict")]
    Map,
    /// Event sink; carries no value
    Event,
}

impl TopicKind {
    /// Returns the wire tag of this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            TopicKind::Int => "int",
            TopicKind::Float => "float",
            TopicKind::String => "string",
            TopicKind::Generic => "generic",
            TopicKind::List => "list",
            TopicKind::Set => "set",
            TopicKind::Map => "dict",
            TopicKind::Event => "event",
        }
    }

    /// Returns the value a freshly added topic of this kind holds.
    pub fn default_value(&self) -> Value {
        match self {
            TopicKind::Int => Value::Int(0),
            TopicKind::Float => Value::Float(0.0),
            TopicKind::String => Value::Text(String::new()),
            TopicKind::Generic | TopicKind::Event => Value::Null,
            TopicKind::List | TopicKind::Set => Value::List(Vec::new()),
            TopicKind::Map => Value::Map(Default::default()),
        }
    }

    /// Returns true if collection mutators (insert/pop/append/remove) apply to this kind.
    pub fn is_sequence(&self) -> bool {
        matches!(self, TopicKind::List | TopicKind::Set)
    }

    /// Checks a value against this kind and normalizes it.
    ///
    /// Integers widen into float topics. Set values must not contain duplicates.
    /// Returns `None` when the value does not fit.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (TopicKind::Generic, value) => Some(value),
            (TopicKind::Int, value @ Value::Int(_)) => Some(value),
            (TopicKind::Float, Value::Int(n)) => Some(Value::Float(n as f64)),
            (TopicKind::Float, value @ Value::Float(_)) => Some(value),
            (TopicKind::String, value @ Value::Text(_)) => Some(value),
            (TopicKind::List, value @ Value::List(_)) => Some(value),
            (TopicKind::Set, Value::List(items)) => {
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if unique.contains(&item) {
                        return None;
                    }
                    unique.push(item);
                }
                Some(Value::List(unique))
            }
            (TopicKind::Map, value @ Value::Map(_)) => Some(value),
            (TopicKind::Event, Value::Null) => Some(Value::Null),
            _ => None,
        }
    }
}

impl std::fmt::Display for TopicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}
