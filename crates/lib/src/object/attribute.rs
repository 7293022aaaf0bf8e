//! Attribute type tags and attribute handles.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::ObjectError;
use crate::{
    ObjectId, Result, Server,
    topic::{Change, Mutation, TopicKey, TopicKind, Value},
};

/// Type tag of an attribute.
///
/// The plain kinds map one to one onto topic kinds. The `Obj*` variants store raw object ids in
/// the topic of the underlying kind and are read through [`super::ObjAttribute`], which
/// resolves those ids to live objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Int,
    Float,
    String,
    Generic,
    List,
    Set,
    #[serde(rename = "dict")]
    Map,
    Event,
    /// Reference to one object, stored as a string id (empty = unset)
    Obj,
    /// Ordered references, stored as a list of ids
    ObjList,
    /// Unique references, stored as a set of ids
    ObjSet,
    /// Keyed references, stored as a dict of ids
    #[serde(rename = "obj_dict")]
    ObjMap,
}

impl AttributeType {
    /// Kind of the topic holding the raw value.
    pub fn topic_kind(&self) -> TopicKind {
        match self {
            AttributeType::Int => TopicKind::Int,
            AttributeType::Float => TopicKind::Float,
            AttributeType::String | AttributeType::Obj => TopicKind::String,
            AttributeType::Generic => TopicKind::Generic,
            AttributeType::List | AttributeType::ObjList => TopicKind::List,
            AttributeType::Set | AttributeType::ObjSet => TopicKind::Set,
            AttributeType::Map | AttributeType::ObjMap => TopicKind::Map,
            AttributeType::Event => TopicKind::Event,
        }
    }

    /// True for the object-reference variants.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            AttributeType::Obj
                | AttributeType::ObjList
                | AttributeType::ObjSet
                | AttributeType::ObjMap
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeType::Obj => "obj",
            AttributeType::ObjList => "obj_list",
            AttributeType::ObjSet => "obj_set",
            AttributeType::ObjMap => "obj_dict",
            other => other.topic_kind().type_name(),
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Handle to one attribute of one object.
///
/// The handle is a cheap, cloneable address; the value itself lives in the server's topic
/// store under `a/{object}/{name}`. Every mutator goes through the server so the change is
/// recorded into the open transition and delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    object: ObjectId,
    name: String,
    ty: AttributeType,
    stateful: bool,
}

impl Attribute {
    pub(crate) fn new(object: ObjectId, name: String, ty: AttributeType, stateful: bool) -> Self {
        Self {
            object,
            name,
            ty,
            stateful,
        }
    }

    /// Id of the owning object.
    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> AttributeType {
        self.ty
    }

    pub fn is_stateful(&self) -> bool {
        self.stateful
    }

    /// Topic holding this attribute's value.
    pub fn key(&self) -> TopicKey {
        TopicKey::attribute(&self.object, &self.name)
    }

    pub fn get<'s>(&self, server: &'s Server) -> Result<&'s Value> {
        server.get(&self.key())
    }

    /// Read the value into any deserializable type.
    pub fn get_as<T: DeserializeOwned>(&self, server: &Server) -> Result<T> {
        self.get(server)?.deserialize_into()
    }

    pub fn set(&self, server: &mut Server, value: impl Into<Value>) -> Result<()> {
        server.mutate(&self.key(), Mutation::Set(value.into()))?;
        Ok(())
    }

    pub fn insert(&self, server: &mut Server, index: usize, value: impl Into<Value>) -> Result<()> {
        server.mutate(
            &self.key(),
            Mutation::Insert {
                index: Some(index),
                value: value.into(),
            },
        )?;
        Ok(())
    }

    /// Remove and return the element at `index`, or the last one.
    pub fn pop(&self, server: &mut Server, index: Option<usize>) -> Result<Value> {
        match server.mutate(&self.key(), Mutation::Pop { index })? {
            Some(Change::Pop { value, .. }) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    pub fn append(&self, server: &mut Server, value: impl Into<Value>) -> Result<()> {
        server.mutate(&self.key(), Mutation::Append(value.into()))?;
        Ok(())
    }

    pub fn remove(&self, server: &mut Server, value: impl Into<Value>) -> Result<()> {
        server.mutate(&self.key(), Mutation::Remove(value.into()))?;
        Ok(())
    }

    pub fn add(&self, server: &mut Server, key: &str, value: impl Into<Value>) -> Result<()> {
        server.mutate(
            &self.key(),
            Mutation::Add {
                key: key.to_string(),
                value: value.into(),
            },
        )?;
        Ok(())
    }

    /// Remove a map entry, returning its value.
    pub fn delete(&self, server: &mut Server, key: &str) -> Result<Value> {
        match server.mutate(
            &self.key(),
            Mutation::Delete {
                key: key.to_string(),
            },
        )? {
            Some(Change::Delete { value, .. }) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    pub fn change_value(
        &self,
        server: &mut Server,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        server.mutate(
            &self.key(),
            Mutation::ChangeValue {
                key: key.to_string(),
                value: value.into(),
            },
        )?;
        Ok(())
    }

    /// Fire an event attribute.
    ///
    /// Runs the handlers registered for this event on the owning object, if any, and notifies
    /// observers of the attribute.
    pub fn emit(&self, server: &mut Server, args: impl Into<Value>) -> Result<Value> {
        if self.ty != AttributeType::Event {
            return Err(self.type_error(AttributeType::Event).into());
        }
        server.emit_object(&self.object, &self.name, args.into())
    }

    /// Call `f` after every change to this attribute, including undo and redo.
    pub fn observe<F>(&self, server: &mut Server, f: F) -> Result<()>
    where
        F: Fn(&Server, &Change) + 'static,
    {
        server.observe(self.key(), f)
    }

    pub(crate) fn type_error(&self, expected: AttributeType) -> ObjectError {
        ObjectError::InvalidAttributeType {
            object: self.object.to_string(),
            name: self.name.clone(),
            expected: expected.to_string(),
            actual: self.ty.to_string(),
        }
    }
}
