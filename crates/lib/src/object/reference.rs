//! Object-reference attributes.
//!
//! A reference attribute stores raw object ids in a plain topic. Reads and observer callbacks
//! translate those ids to live [`SObject`]s on the way out. An id that does not resolve yields
//! `None`; that happens legitimately while a subtree is still being built or restored.

use indexmap::IndexMap;

use super::{Attribute, AttributeType, ObjectError, SObject};
use crate::{
    ObjectId, Result, Server,
    topic::{Change, Value},
};

/// A reference that may or may not resolve.
pub type Resolved<'a> = Option<&'a SObject>;

/// A reference attribute value with every id translated.
#[derive(Debug)]
pub enum References<'a> {
    One(Resolved<'a>),
    Many(Vec<Resolved<'a>>),
    Keyed(IndexMap<String, Resolved<'a>>),
}

/// A change to a reference attribute, with ids already resolved.
#[derive(Debug)]
pub enum ObjEvent<'a> {
    Set {
        old: References<'a>,
        new: References<'a>,
    },
    Inserted {
        index: usize,
        object: Resolved<'a>,
    },
    Popped {
        index: usize,
        object: Resolved<'a>,
    },
    Appended {
        index: usize,
        object: Resolved<'a>,
    },
    Removed {
        index: usize,
        object: Resolved<'a>,
    },
    Added {
        key: &'a str,
        object: Resolved<'a>,
    },
    Deleted {
        key: &'a str,
        object: Resolved<'a>,
    },
    ValueChanged {
        key: &'a str,
        old: Resolved<'a>,
        new: Resolved<'a>,
    },
}

/// Handle to an attribute of type `obj`, `obj_list`, `obj_set` or `obj_dict`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjAttribute {
    inner: Attribute,
}

impl TryFrom<Attribute> for ObjAttribute {
    type Error = crate::Error;

    fn try_from(inner: Attribute) -> Result<Self> {
        if inner.ty().is_reference() {
            Ok(Self { inner })
        } else {
            Err(inner.type_error(AttributeType::Obj).into())
        }
    }
}

impl ObjAttribute {
    /// The raw attribute underneath.
    pub fn attribute(&self) -> &Attribute {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn ty(&self) -> AttributeType {
        self.inner.ty()
    }

    fn expect(&self, types: &[AttributeType]) -> Result<()> {
        if types.contains(&self.ty()) {
            Ok(())
        } else {
            Err(self.inner.type_error(types[0]).into())
        }
    }

    /// The referenced object of an `obj` attribute.
    pub fn get_one<'s>(&self, server: &'s Server) -> Result<Resolved<'s>> {
        self.expect(&[AttributeType::Obj])?;
        Ok(resolve(server, self.inner.get(server)?))
    }

    /// Like [`ObjAttribute::get_one`], failing when the reference is unset or dangling.
    pub fn require_one<'s>(&self, server: &'s Server) -> Result<&'s SObject> {
        self.get_one(server)?.ok_or_else(|| {
            ObjectError::UnresolvedReference {
                object: self.inner.object().to_string(),
                field: self.name().to_string(),
                target: self
                    .inner
                    .get(server)
                    .map(Value::to_string)
                    .unwrap_or_default(),
            }
            .into()
        })
    }

    /// The referenced objects of an `obj_list` attribute, in order.
    pub fn get_list<'s>(&self, server: &'s Server) -> Result<Vec<Resolved<'s>>> {
        self.expect(&[AttributeType::ObjList, AttributeType::ObjSet])?;
        Ok(resolve_many(server, self.inner.get(server)?))
    }

    /// The referenced objects of an `obj_set` attribute, in insertion order.
    pub fn get_set<'s>(&self, server: &'s Server) -> Result<Vec<Resolved<'s>>> {
        self.expect(&[AttributeType::ObjSet, AttributeType::ObjList])?;
        Ok(resolve_many(server, self.inner.get(server)?))
    }

    /// The referenced objects of an `obj_dict` attribute, by key in insertion order.
    pub fn get_map<'s>(&self, server: &'s Server) -> Result<IndexMap<String, Resolved<'s>>> {
        self.expect(&[AttributeType::ObjMap])?;
        Ok(resolve_keyed(server, self.inner.get(server)?))
    }

    /// Every id stored in the attribute, whether or not it resolves.
    pub fn ids(&self, server: &Server) -> Result<Vec<ObjectId>> {
        let value = self.inner.get(server)?;
        let ids = match value {
            Value::List(items) => items.iter().filter_map(Value::as_object_id).collect(),
            Value::Map(map) => map.values().filter_map(Value::as_object_id).collect(),
            other => other.as_object_id().into_iter().collect(),
        };
        Ok(ids)
    }

    /// Point an `obj` attribute at an object, or clear it.
    pub fn set(&self, server: &mut Server, target: Option<&ObjectId>) -> Result<()> {
        self.expect(&[AttributeType::Obj])?;
        let value = target.map(Value::from).unwrap_or_else(|| Value::from(""));
        self.inner.set(server, value)
    }

    /// Replace the whole reference collection of an `obj_list` or `obj_set` attribute.
    pub fn set_all(&self, server: &mut Server, targets: &[ObjectId]) -> Result<()> {
        self.expect(&[AttributeType::ObjList, AttributeType::ObjSet])?;
        let value = Value::List(targets.iter().map(Value::from).collect());
        self.inner.set(server, value)
    }

    pub fn insert(&self, server: &mut Server, index: usize, target: &ObjectId) -> Result<()> {
        self.expect(&[AttributeType::ObjList, AttributeType::ObjSet])?;
        self.inner.insert(server, index, target)
    }

    pub fn append(&self, server: &mut Server, target: &ObjectId) -> Result<()> {
        self.expect(&[AttributeType::ObjList, AttributeType::ObjSet])?;
        self.inner.append(server, target)
    }

    pub fn remove(&self, server: &mut Server, target: &ObjectId) -> Result<()> {
        self.expect(&[AttributeType::ObjList, AttributeType::ObjSet])?;
        self.inner.remove(server, target)
    }

    /// Remove the reference at `index` (or the last one) and return its id.
    pub fn pop(&self, server: &mut Server, index: Option<usize>) -> Result<Option<ObjectId>> {
        self.expect(&[AttributeType::ObjList, AttributeType::ObjSet])?;
        Ok(self.inner.pop(server, index)?.as_object_id())
    }

    pub fn add(&self, server: &mut Server, key: &str, target: &ObjectId) -> Result<()> {
        self.expect(&[AttributeType::ObjMap])?;
        self.inner.add(server, key, target)
    }

    pub fn change_value(&self, server: &mut Server, key: &str, target: &ObjectId) -> Result<()> {
        self.expect(&[AttributeType::ObjMap])?;
        self.inner.change_value(server, key, target)
    }

    pub fn delete(&self, server: &mut Server, key: &str) -> Result<Option<ObjectId>> {
        self.expect(&[AttributeType::ObjMap])?;
        Ok(self.inner.delete(server, key)?.as_object_id())
    }

    /// Call `f` after every change, with the affected ids already resolved.
    pub fn observe<F>(&self, server: &mut Server, f: F) -> Result<()>
    where
        F: for<'a> Fn(&'a Server, ObjEvent<'a>) + 'static,
    {
        self.inner.observe(server, move |server, change| {
            if let Some(event) = translate(server, change) {
                f(server, event);
            }
        })
    }
}

fn resolve<'s>(server: &'s Server, value: &Value) -> Resolved<'s> {
    value
        .as_object_id()
        .and_then(|id| server.try_get_object(&id))
}

fn resolve_many<'s>(server: &'s Server, value: &Value) -> Vec<Resolved<'s>> {
    value
        .as_list()
        .map(|items| items.iter().map(|item| resolve(server, item)).collect())
        .unwrap_or_default()
}

fn resolve_keyed<'s>(server: &'s Server, value: &Value) -> IndexMap<String, Resolved<'s>> {
    value
        .as_map()
        .map(|map| {
            map.iter()
                .map(|(key, item)| (key.clone(), resolve(server, item)))
                .collect()
        })
        .unwrap_or_default()
}

fn resolve_any<'s>(server: &'s Server, value: &Value) -> References<'s> {
    match value {
        Value::List(_) => References::Many(resolve_many(server, value)),
        Value::Map(_) => References::Keyed(resolve_keyed(server, value)),
        other => References::One(resolve(server, other)),
    }
}

fn translate<'a>(server: &'a Server, change: &'a Change) -> Option<ObjEvent<'a>> {
    let event = match change {
        Change::Set { old, new, .. } => ObjEvent::Set {
            old: resolve_any(server, old),
            new: resolve_any(server, new),
        },
        Change::Insert { index, value, .. } => ObjEvent::Inserted {
            index: *index,
            object: resolve(server, value),
        },
        Change::Pop { index, value, .. } => ObjEvent::Popped {
            index: *index,
            object: resolve(server, value),
        },
        Change::Append { index, value, .. } => ObjEvent::Appended {
            index: *index,
            object: resolve(server, value),
        },
        Change::Remove { index, value, .. } => ObjEvent::Removed {
            index: *index,
            object: resolve(server, value),
        },
        Change::Add { key, value, .. } => ObjEvent::Added {
            key,
            object: resolve(server, value),
        },
        Change::Delete { key, value, .. } => ObjEvent::Deleted {
            key,
            object: resolve(server, value),
        },
        Change::ChangeValue { key, old, new, .. } => ObjEvent::ValueChanged {
            key,
            old: resolve(server, old),
            new: resolve(server, new),
        },
        Change::Event { .. } => return None,
    };
    Some(event)
}
