//! Structured topic and event names.
//!
//! Topics and events are addressed by typed keys so the server never has to split strings to
//! find the object a change belongs to. The `Display` form of each key is the wire name
//! remote clients see, and `FromStr` parses wire names back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::TopicError;
use crate::{
    ObjectId,
    constants::{ATTRIBUTE, CREATE_OBJECT, DESTROY_OBJECT, OBJECTS, PARENT_ID, TAGS},
};

/// Name of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicKey {
    /// `_objects`: map of live object ids to type names
    Objects,
    /// `parent_id/{object_id}`
    ParentId(ObjectId),
    /// `tags/{object_id}`
    Tags(ObjectId),
    /// `a/{object_id}/{name}`
    Attribute { object: ObjectId, name: String },
    /// Any other, process-wide topic
    Named(String),
}

impl TopicKey {
    pub fn attribute(object: &ObjectId, name: impl Into<String>) -> Self {
        TopicKey::Attribute {
            object: object.clone(),
            name: name.into(),
        }
    }

    /// The object this topic belongs to, if any.
    pub fn owner(&self) -> Option<&ObjectId> {
        match self {
            TopicKey::ParentId(id) | TopicKey::Tags(id) => Some(id),
            TopicKey::Attribute { object, .. } => Some(object),
            TopicKey::Objects | TopicKey::Named(_) => None,
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKey::Objects => f.write_str(OBJECTS),
            TopicKey::ParentId(id) => write!(f, "{PARENT_ID}/{id}"),
            TopicKey::Tags(id) => write!(f, "{TAGS}/{id}"),
            TopicKey::Attribute { object, name } => write!(f, "{ATTRIBUTE}/{object}/{name}"),
            TopicKey::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for TopicKey {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TopicError::InvalidTopicName {
                name: s.to_string(),
            });
        }
        if s == OBJECTS {
            return Ok(TopicKey::Objects);
        }
        if let Some((object, name)) = parse_attribute(s)? {
            return Ok(TopicKey::Attribute { object, name });
        }
        match s.split_once('/') {
            Some((PARENT_ID, id)) => Ok(TopicKey::ParentId(parse_id(s, id)?)),
            Some((TAGS, id)) => Ok(TopicKey::Tags(parse_id(s, id)?)),
            _ => Ok(TopicKey::Named(s.to_string())),
        }
    }
}

/// Name of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKey {
    /// `create_object`
    CreateObject,
    /// `destroy_object`
    DestroyObject,
    /// `a/{object_id}/{name}`: an event owned by an object
    Object { object: ObjectId, name: String },
    /// Any other, process-wide event
    Named(String),
}

impl EventKey {
    pub fn object(object: &ObjectId, name: impl Into<String>) -> Self {
        EventKey::Object {
            object: object.clone(),
            name: name.into(),
        }
    }

    /// The object this event belongs to, if any.
    pub fn owner(&self) -> Option<&ObjectId> {
        match self {
            EventKey::Object { object, .. } => Some(object),
            _ => None,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::CreateObject => f.write_str(CREATE_OBJECT),
            EventKey::DestroyObject => f.write_str(DESTROY_OBJECT),
            EventKey::Object { object, name } => write!(f, "{ATTRIBUTE}/{object}/{name}"),
            EventKey::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for EventKey {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(TopicError::InvalidTopicName {
                name: s.to_string(),
            }),
            CREATE_OBJECT => Ok(EventKey::CreateObject),
            DESTROY_OBJECT => Ok(EventKey::DestroyObject),
            _ => match parse_attribute(s)? {
                Some((object, name)) => Ok(EventKey::Object { object, name }),
                None => Ok(EventKey::Named(s.to_string())),
            },
        }
    }
}

/// Parses `a/{id}/{name}`. The id ends at the first `/` after the prefix.
fn parse_attribute(s: &str) -> Result<Option<(ObjectId, String)>, TopicError> {
    let Some(rest) = s
        .strip_prefix(ATTRIBUTE)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Ok(None);
    };
    match rest.split_once('/') {
        Some((id, name)) if !id.is_empty() && !name.is_empty() => {
            Ok(Some((ObjectId::from(id), name.to_string())))
        }
        _ => Err(TopicError::InvalidTopicName {
            name: s.to_string(),
        }),
    }
}

fn parse_id(full: &str, id: &str) -> Result<ObjectId, TopicError> {
    let id = ObjectId::from(id);
    if id.is_valid() {
        Ok(id)
    } else {
        Err(TopicError::InvalidTopicName {
            name: full.to_string(),
        })
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(TopicKey);
string_serde!(EventKey);
