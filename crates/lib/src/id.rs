//! Object identifiers and id generation.
//!
//! Generated ids sort lexicographically in generation order, which is the ordering key used
//! when a subtree is restored from a snapshot.

use serde::{Deserialize, Serialize};

use crate::{Clock, constants::ROOT_ID};

/// Identifier of an object in the tree.
///
/// Unique across the whole tree for the lifetime of the server (or restored snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Creates a new ID from any string-like input.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The fixed id of the root object.
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Returns true if this is the root id.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the ID is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the id can be embedded in a topic name.
    ///
    /// Topic names use `/` as the namespace separator, so ids must not contain it.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && !self.0.contains('/')
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&ObjectId> for ObjectId {
    fn from(id: &ObjectId) -> Self {
        id.clone()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}

impl std::ops::Deref for ObjectId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<str> for ObjectId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ObjectId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<ObjectId> for &str {
    fn eq(&self, other: &ObjectId) -> bool {
        *self == other.0
    }
}

/// Generates object ids that sort in generation order.
///
/// Format: `{millis:012x}-{seq:06x}-{random:8}`. `millis` is clamped so it never goes
/// backwards, `seq` strictly increases within a generator, and the random suffix keeps ids
/// from different processes apart.
#[derive(Debug, Default)]
pub struct IdGenerator {
    seq: u64,
    last_millis: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next id.
    pub fn next_id(&mut self, clock: &dyn Clock) -> ObjectId {
        self.last_millis = self.last_millis.max(clock.now_millis());
        self.seq += 1;
        let random = uuid::Uuid::new_v4().simple().to_string();
        ObjectId(format!(
            "{:012x}-{:06x}-{}",
            self.last_millis,
            self.seq,
            &random[..8]
        ))
    }
}
