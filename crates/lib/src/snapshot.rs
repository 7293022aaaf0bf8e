//! Serialized form of a subtree.
//!
//! A [`Snapshot`] is what `destroy` hands back and what `create` accepts to restore a subtree
//! without re-running any build logic. It is plain serde data, so it round-trips through JSON
//! (or any other serde format) without losing type tags, persistence flags or reference
//! bindings.
//!
//! ```json
//! {
//!   "id": "0190c6f2a1b0-000003-9f1c2d3e",
//!   "type": "Text",
//!   "attributes": [
//!     { "name": "text", "type": "string", "value": "Hello", "is_stateful": true }
//!   ],
//!   "children": {},
//!   "attribute_refs": { "text": "text" },
//!   "child_refs": {}
//! }
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{AttributeType, ObjectId, Result, Server, topic::Value};

/// One attribute as `(name, type, value, stateful)`.
///
/// A non-stateful attribute carries its type's default value, not its live one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub value: Value,
    pub is_stateful: bool,
}

/// Recursive snapshot of an object and its descendants.
///
/// `children` keeps the live child order. Note that `IndexMap` equality ignores order, so
/// compare `children.keys()` when order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: Vec<AttributeSnapshot>,
    #[serde(default)]
    pub children: IndexMap<ObjectId, Snapshot>,
    /// field name -> attribute name, bound during build
    #[serde(default)]
    pub attribute_refs: BTreeMap<String, String>,
    /// field name -> child id, bound during build
    #[serde(default)]
    pub child_refs: BTreeMap<String, ObjectId>,
}

impl Snapshot {
    /// Capture the subtree rooted at `id`.
    pub fn capture(server: &Server, id: &ObjectId) -> Result<Self> {
        let object = server.get_object(id)?;
        let attributes = object
            .attributes()
            .map(|attribute| {
                // events and transient attributes are re-declared on restore, never refilled
                let value = if attribute.ty() == AttributeType::Event || !attribute.is_stateful() {
                    attribute.ty().topic_kind().default_value()
                } else {
                    attribute.get(server)?.clone()
                };
                Ok(AttributeSnapshot {
                    name: attribute.name().to_string(),
                    ty: attribute.ty(),
                    value,
                    is_stateful: attribute.is_stateful(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let children = object
            .children()
            .iter()
            .map(|child| Ok((child.clone(), Snapshot::capture(server, child)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Snapshot {
            id: id.clone(),
            type_name: object.type_name().to_string(),
            attributes,
            children,
            attribute_refs: object.attribute_refs().clone(),
            child_refs: object.child_refs().clone(),
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSnapshot> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Find the snapshot of `id` anywhere in this subtree.
    pub fn find(&self, id: &ObjectId) -> Option<&Snapshot> {
        if &self.id == id {
            return Some(self);
        }
        self.children.values().find_map(|child| child.find(id))
    }

    /// Ids of every node in the subtree, pre-order, this node first.
    pub fn descendant_ids(&self) -> Vec<ObjectId> {
        let mut ids = vec![self.id.clone()];
        for child in self.children.values() {
            ids.extend(child.descendant_ids());
        }
        ids
    }

    /// Children in creation order: generated ids sort in generation order.
    pub(crate) fn children_by_id(&self) -> Vec<&Snapshot> {
        let mut children: Vec<&Snapshot> = self.children.values().collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        children
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
