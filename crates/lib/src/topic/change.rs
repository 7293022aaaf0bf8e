//! Invertible changes and transitions.
//!
//! A [`Change`] is the structured record of one topic mutation or one event emission. It carries
//! enough data to compute its exact inverse, and its typed keys tell the server which objects it
//! touches without parsing topic names.

use serde::{Deserialize, Serialize};

use super::{EventKey, TopicKey, Value};
use crate::{ObjectId, constants::PARENT_ID};

/// One recorded, invertible mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    /// Whole-value replacement
    Set {
        topic: TopicKey,
        old: Value,
        new: Value,
    },
    /// Sequence element inserted at `index`
    Insert {
        topic: TopicKey,
        index: usize,
        value: Value,
    },
    /// Sequence element removed from `index`
    Pop {
        topic: TopicKey,
        index: usize,
        value: Value,
    },
    /// Element appended; `index` is where it landed
    Append {
        topic: TopicKey,
        index: usize,
        value: Value,
    },
    /// Element removed by value; `index` is where it was
    Remove {
        topic: TopicKey,
        index: usize,
        value: Value,
    },
    /// Map entry added
    Add {
        topic: TopicKey,
        key: String,
        value: Value,
    },
    /// Map entry deleted
    Delete {
        topic: TopicKey,
        key: String,
        value: Value,
    },
    /// Map entry replaced
    ChangeValue {
        topic: TopicKey,
        key: String,
        old: Value,
        new: Value,
    },
    /// Event emission. `inverse` is the payload handed to the inverse handler on undo.
    Event {
        event: EventKey,
        forward: Value,
        inverse: Value,
    },
}

impl Change {
    /// The topic this change mutates. `None` for events.
    pub fn topic(&self) -> Option<&TopicKey> {
        match self {
            Change::Set { topic, .. }
            | Change::Insert { topic, .. }
            | Change::Pop { topic, .. }
            | Change::Append { topic, .. }
            | Change::Remove { topic, .. }
            | Change::Add { topic, .. }
            | Change::Delete { topic, .. }
            | Change::ChangeValue { topic, .. } => Some(topic),
            Change::Event { .. } => None,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Change::Event { .. })
    }

    /// Returns the change that undoes this one.
    ///
    /// Event changes have no store-level inverse; the server runs the event's inverse handler
    /// with the recorded `inverse` payload instead.
    pub fn inverse(&self) -> Option<Change> {
        let inverse = match self.clone() {
            Change::Set { topic, old, new } => Change::Set {
                topic,
                old: new,
                new: old,
            },
            Change::Insert {
                topic,
                index,
                value,
            } => Change::Pop {
                topic,
                index,
                value,
            },
            Change::Pop {
                topic,
                index,
                value,
            } => Change::Insert {
                topic,
                index,
                value,
            },
            Change::Append {
                topic,
                index,
                value,
            } => Change::Remove {
                topic,
                index,
                value,
            },
            Change::Remove {
                topic,
                index,
                value,
            } => Change::Append {
                topic,
                index,
                value,
            },
            Change::Add { topic, key, value } => Change::Delete { topic, key, value },
            Change::Delete { topic, key, value } => Change::Add { topic, key, value },
            Change::ChangeValue {
                topic,
                key,
                old,
                new,
            } => Change::ChangeValue {
                topic,
                key,
                old: new,
                new: old,
            },
            Change::Event { .. } => return None,
        };
        Some(inverse)
    }

    /// Objects whose subtree this change touches.
    ///
    /// Attribute, tag and per-object event changes touch their owner. A reparent touches both
    /// the old and the new parent. Create and destroy touch the parent named in either payload.
    pub fn affected_objects(&self) -> Vec<ObjectId> {
        match self {
            Change::Set {
                topic: TopicKey::ParentId(_),
                old,
                new,
            } => [old.as_object_id(), new.as_object_id()]
                .into_iter()
                .flatten()
                .collect(),
            Change::Event {
                event: EventKey::CreateObject | EventKey::DestroyObject,
                forward,
                inverse,
            } => forward
                .get(PARENT_ID)
                .or_else(|| inverse.get(PARENT_ID))
                .and_then(Value::as_object_id)
                .into_iter()
                .collect(),
            Change::Event { event, .. } => event.owner().cloned().into_iter().collect(),
            other => other
                .topic()
                .and_then(TopicKey::owner)
                .cloned()
                .into_iter()
                .collect(),
        }
    }
}

/// Direction a transition is being applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// First application or redo
    Forward,
    /// Undo
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// An atomically applied bundle of changes; the unit of undo/redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Monotonic per-server sequence number
    pub id: u64,
    /// Milliseconds since Unix epoch at finalization
    pub timestamp: u64,
    pub changes: Vec<Change>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// All objects touched by any change, first occurrence order, without duplicates.
    pub fn affected_objects(&self) -> Vec<ObjectId> {
        let mut affected: Vec<ObjectId> = Vec::new();
        for id in self.changes.iter().flat_map(Change::affected_objects) {
            if !affected.contains(&id) {
                affected.push(id);
            }
        }
        affected
    }
}
