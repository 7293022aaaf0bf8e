//! In-process topic store.
//!
//! Topics are named, typed value cells. Every mutation goes through [`TopicStore::mutate`],
//! which validates it against the topic kind, applies it and returns the structured
//! [`Change`] describing it. While a grouping scope is open ([`TopicStore::begin`]), changes to
//! stateful topics and event emissions accumulate and are finalized into one [`Transition`] when
//! the outermost scope ends.
//!
//! Undo and redo never go through `mutate`: they apply a recorded change (or its inverse)
//! directly with [`TopicStore::apply`] while recording is suppressed.

mod change;
mod errors;
mod key;
mod kind;
mod value;

use std::collections::HashMap;

pub use change::{Change, Direction, Transition};
pub use errors::TopicError;
pub use key::{EventKey, TopicKey};
pub use kind::TopicKind;
pub use value::Value;

use crate::Result;

/// A single topic: its kind, current value and persistence flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    kind: TopicKind,
    value: Value,
    stateful: bool,
}

impl Topic {
    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Stateful topics are recorded into transitions and included in snapshots.
    pub fn is_stateful(&self) -> bool {
        self.stateful
    }
}

/// A requested mutation, before validation.
///
/// Sequence operations apply to `list` and `set` topics; keyed operations apply to `dict`
/// topics. `None` indices mean "at the end".
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Set(Value),
    Insert { index: Option<usize>, value: Value },
    Pop { index: Option<usize> },
    Append(Value),
    Remove(Value),
    Add { key: String, value: Value },
    Delete { key: String },
    ChangeValue { key: String, value: Value },
}

/// Named, typed, observable value cells with transition grouping.
#[derive(Debug, Default)]
pub struct TopicStore {
    topics: HashMap<TopicKey, Topic>,
    pending: Vec<Change>,
    depth: usize,
    suppressed: usize,
    next_transition: u64,
}

impl TopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic. `init` defaults to the kind's empty value.
    pub fn add_topic(
        &mut self,
        key: TopicKey,
        kind: TopicKind,
        init: Option<Value>,
        stateful: bool,
    ) -> Result<()> {
        if self.topics.contains_key(&key) {
            return Err(TopicError::TopicExists {
                topic: key.to_string(),
            }
            .into());
        }
        let value = match init {
            Some(value) => coerce(&key, kind, value)?,
            None => kind.default_value(),
        };
        tracing::trace!(topic = %key, kind = %kind, "add topic");
        self.topics.insert(
            key,
            Topic {
                kind,
                value,
                stateful,
            },
        );
        Ok(())
    }

    pub fn remove_topic(&mut self, key: &TopicKey) -> Result<Topic> {
        self.topics.remove(key).ok_or_else(|| not_found(key))
    }

    pub fn contains(&self, key: &TopicKey) -> bool {
        self.topics.contains_key(key)
    }

    pub fn topic(&self, key: &TopicKey) -> Result<&Topic> {
        self.topics.get(key).ok_or_else(|| not_found(key))
    }

    /// Current value of a topic.
    pub fn get(&self, key: &TopicKey) -> Result<&Value> {
        self.topic(key).map(Topic::value)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TopicKey> {
        self.topics.keys()
    }

    /// Validate, apply and record a mutation.
    ///
    /// Returns `Ok(None)` when the mutation would not change anything, such as setting an equal
    /// value or appending an element a set already holds.
    pub fn mutate(&mut self, key: &TopicKey, mutation: Mutation) -> Result<Option<Change>> {
        let topic = self.topic(key)?;
        let Some(change) = plan(key, topic, mutation)? else {
            return Ok(None);
        };
        let stateful = topic.stateful;
        self.apply(&change)?;
        tracing::trace!(topic = %key, ?change, "mutate");
        if stateful && self.suppressed == 0 {
            self.pending.push(change.clone());
        }
        Ok(Some(change))
    }

    /// Apply an already-validated change without recording it.
    ///
    /// Event changes are accepted and ignored; the server dispatches them.
    pub fn apply(&mut self, change: &Change) -> Result<()> {
        let Some(key) = change.topic() else {
            return Ok(());
        };
        let topic = self.topics.get_mut(key).ok_or_else(|| not_found(key))?;
        match change {
            Change::Set { new, .. } => topic.value = new.clone(),
            Change::Insert { index, value, .. } | Change::Append { index, value, .. } => {
                let items = sequence_mut(key, topic)?;
                if *index > items.len() {
                    return Err(out_of_range(key, *index, items.len()));
                }
                items.insert(*index, value.clone());
            }
            Change::Pop { index, value, .. } | Change::Remove { index, value, .. } => {
                let items = sequence_mut(key, topic)?;
                if items.get(*index) != Some(value) {
                    return Err(TopicError::ValueNotFound {
                        topic: key.to_string(),
                        value: value.to_string(),
                    }
                    .into());
                }
                items.remove(*index);
            }
            Change::Add { key: k, value, .. } => {
                let map = map_mut(key, topic)?;
                if map.contains_key(k) {
                    return Err(TopicError::KeyExists {
                        topic: key.to_string(),
                        key: k.clone(),
                    }
                    .into());
                }
                map.insert(k.clone(), value.clone());
            }
            Change::Delete { key: k, .. } => {
                let map = map_mut(key, topic)?;
                if map.shift_remove(k).is_none() {
                    return Err(key_not_found(key, k));
                }
            }
            Change::ChangeValue { key: k, new, .. } => {
                let map = map_mut(key, topic)?;
                match map.get_mut(k) {
                    Some(slot) => *slot = new.clone(),
                    None => return Err(key_not_found(key, k)),
                }
            }
            Change::Event { .. } => {}
        }
        Ok(())
    }

    /// Record an event emission into the open transition.
    pub fn record_event(&mut self, change: Change) {
        if self.suppressed == 0 {
            self.pending.push(change);
        }
    }

    /// Open a grouping scope. Scopes nest.
    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close a grouping scope.
    ///
    /// Closing the outermost scope finalizes the pending changes into a transition, or returns
    /// `None` if nothing was recorded.
    pub fn end(&mut self, timestamp: u64) -> Option<Transition> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 || self.pending.is_empty() {
            return None;
        }
        self.next_transition += 1;
        Some(Transition {
            id: self.next_transition,
            timestamp,
            changes: std::mem::take(&mut self.pending),
        })
    }

    pub fn is_recording(&self) -> bool {
        self.depth > 0
    }

    /// Stop recording until the matching [`TopicStore::unsuppress`]. Suppression nests.
    pub fn suppress(&mut self) {
        self.suppressed += 1;
    }

    pub fn unsuppress(&mut self) {
        self.suppressed = self.suppressed.saturating_sub(1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed > 0
    }
}

/// Turn a mutation into the change it would produce, or `None` for a no-op.
fn plan(key: &TopicKey, topic: &Topic, mutation: Mutation) -> Result<Option<Change>> {
    let topic_key = key.clone();
    let change = match mutation {
        Mutation::Set(value) => {
            if topic.kind == TopicKind::Event {
                return Err(mismatch(key, topic.kind, &value));
            }
            let new = coerce(key, topic.kind, value)?;
            if new == topic.value {
                return Ok(None);
            }
            Change::Set {
                topic: topic_key,
                old: topic.value.clone(),
                new,
            }
        }
        Mutation::Insert { index, value } => {
            let items = sequence(key, topic)?;
            if topic.kind == TopicKind::Set && items.contains(&value) {
                return Ok(None);
            }
            let index = index.unwrap_or(items.len());
            if index > items.len() {
                return Err(out_of_range(key, index, items.len()));
            }
            Change::Insert {
                topic: topic_key,
                index,
                value,
            }
        }
        Mutation::Pop { index } => {
            let items = sequence(key, topic)?;
            let index = match index {
                Some(index) => index,
                None => items.len().checked_sub(1).ok_or_else(|| out_of_range(key, 0, 0))?,
            };
            let value = items
                .get(index)
                .cloned()
                .ok_or_else(|| out_of_range(key, index, items.len()))?;
            Change::Pop {
                topic: topic_key,
                index,
                value,
            }
        }
        Mutation::Append(value) => {
            let items = sequence(key, topic)?;
            if topic.kind == TopicKind::Set && items.contains(&value) {
                return Ok(None);
            }
            Change::Append {
                topic: topic_key,
                index: items.len(),
                value,
            }
        }
        Mutation::Remove(value) => {
            let items = sequence(key, topic)?;
            let index = items.iter().position(|item| *item == value).ok_or_else(|| {
                TopicError::ValueNotFound {
                    topic: key.to_string(),
                    value: value.to_string(),
                }
            })?;
            Change::Remove {
                topic: topic_key,
                index,
                value,
            }
        }
        Mutation::Add { key: k, value } => {
            if map(key, topic)?.contains_key(&k) {
                return Err(TopicError::KeyExists {
                    topic: key.to_string(),
                    key: k,
                }
                .into());
            }
            Change::Add {
                topic: topic_key,
                key: k,
                value,
            }
        }
        Mutation::Delete { key: k } => {
            let value = map(key, topic)?
                .get(&k)
                .cloned()
                .ok_or_else(|| key_not_found(key, &k))?;
            Change::Delete {
                topic: topic_key,
                key: k,
                value,
            }
        }
        Mutation::ChangeValue { key: k, value } => {
            let old = map(key, topic)?
                .get(&k)
                .cloned()
                .ok_or_else(|| key_not_found(key, &k))?;
            if old == value {
                return Ok(None);
            }
            Change::ChangeValue {
                topic: topic_key,
                key: k,
                old,
                new: value,
            }
        }
    };
    Ok(Some(change))
}

fn coerce(key: &TopicKey, kind: TopicKind, value: Value) -> Result<Value> {
    let actual = value.type_name();
    kind.coerce(value).ok_or_else(|| {
        TopicError::TypeMismatch {
            topic: key.to_string(),
            expected: kind.to_string(),
            actual: actual.to_string(),
        }
        .into()
    })
}

fn sequence<'a>(key: &TopicKey, topic: &'a Topic) -> Result<&'a Vec<Value>> {
    match (topic.kind.is_sequence(), topic.value.as_list()) {
        (true, Some(items)) => Ok(items),
        _ => Err(mismatch_kind(key, "list or set", topic.kind)),
    }
}

fn sequence_mut<'a>(key: &TopicKey, topic: &'a mut Topic) -> Result<&'a mut Vec<Value>> {
    let kind = topic.kind;
    match topic.value.as_list_mut() {
        Some(items) if kind.is_sequence() => Ok(items),
        _ => Err(mismatch_kind(key, "list or set", kind)),
    }
}

fn map<'a>(
    key: &TopicKey,
    topic: &'a Topic,
) -> Result<&'a indexmap::IndexMap<String, Value>> {
    match (topic.kind, topic.value.as_map()) {
        (TopicKind::Map, Some(map)) => Ok(map),
        _ => Err(mismatch_kind(key, "dict", topic.kind)),
    }
}

fn map_mut<'a>(
    key: &TopicKey,
    topic: &'a mut Topic,
) -> Result<&'a mut indexmap::IndexMap<String, Value>> {
    let kind = topic.kind;
    match topic.value.as_map_mut() {
        Some(map) if kind == TopicKind::Map => Ok(map),
        _ => Err(mismatch_kind(key, "dict", kind)),
    }
}

fn not_found(key: &TopicKey) -> crate::Error {
    TopicError::TopicNotFound {
        topic: key.to_string(),
    }
    .into()
}

fn key_not_found(key: &TopicKey, k: &str) -> crate::Error {
    TopicError::KeyNotFound {
        topic: key.to_string(),
        key: k.to_string(),
    }
    .into()
}

fn out_of_range(key: &TopicKey, index: usize, len: usize) -> crate::Error {
    TopicError::IndexOutOfRange {
        topic: key.to_string(),
        index,
        len,
    }
    .into()
}

fn mismatch(key: &TopicKey, kind: TopicKind, value: &Value) -> crate::Error {
    TopicError::TypeMismatch {
        topic: key.to_string(),
        expected: kind.to_string(),
        actual: value.type_name().to_string(),
    }
    .into()
}

fn mismatch_kind(key: &TopicKey, expected: &str, kind: TopicKind) -> crate::Error {
    TopicError::TypeMismatch {
        topic: key.to_string(),
        expected: expected.to_string(),
        actual: kind.to_string(),
    }
    .into()
}
