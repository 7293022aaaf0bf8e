//! Object nodes.
//!
//! An [`SObject`] is one node of the tree. The server's arena owns every node; nodes refer to
//! their children by id and find their parent through the `parent_id/{id}` topic, so there are
//! no ownership cycles. Attribute values live in the topic store; the node keeps the
//! insertion-ordered table of [`Attribute`] handles that address them.

mod attribute;
mod behavior;
mod errors;
mod reference;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

pub use attribute::{Attribute, AttributeType};
pub use behavior::{BuildContext, ObjectType, RootObject};
pub use errors::ObjectError;
pub use reference::{ObjAttribute, ObjEvent, References, Resolved};

use crate::{
    ObjectId,
    history::{History, HistoryConfig},
};

/// A node of the object tree.
pub struct SObject {
    id: ObjectId,
    type_name: String,
    behavior: Rc<dyn ObjectType>,
    attributes: IndexMap<String, Attribute>,
    children: Vec<ObjectId>,
    history: History,
    destroyed: bool,
    /// Set once the node is in its parent's children list.
    linked: bool,
    /// field name -> attribute name
    attribute_refs: BTreeMap<String, String>,
    /// field name -> child id
    child_refs: BTreeMap<String, ObjectId>,
}

impl fmt::Debug for SObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SObject")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .field("history_len", &self.history.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl SObject {
    pub(crate) fn new(
        id: ObjectId,
        type_name: String,
        behavior: Rc<dyn ObjectType>,
        history: &HistoryConfig,
    ) -> Self {
        Self {
            id,
            type_name,
            behavior,
            attributes: IndexMap::new(),
            children: Vec::new(),
            history: History::new(history),
            destroyed: false,
            linked: false,
            attribute_refs: BTreeMap::new(),
            child_refs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Registered type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Attribute handles in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Live children in order.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn attribute_refs(&self) -> &BTreeMap<String, String> {
        &self.attribute_refs
    }

    pub fn child_refs(&self) -> &BTreeMap<String, ObjectId> {
        &self.child_refs
    }

    /// Behavior of the registered type this node was created from.
    pub fn behavior(&self) -> &dyn ObjectType {
        self.behavior.as_ref()
    }

    pub(crate) fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.linked
    }

    pub(crate) fn set_linked(&mut self, linked: bool) {
        self.linked = linked;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn insert_attribute(&mut self, attribute: Attribute) -> Result<(), ObjectError> {
        if self.attributes.contains_key(attribute.name()) {
            return Err(ObjectError::DuplicateAttribute {
                object: self.id.to_string(),
                name: attribute.name().to_string(),
            });
        }
        self.attributes
            .insert(attribute.name().to_string(), attribute);
        Ok(())
    }

    pub(crate) fn take_attribute(&mut self, name: &str) -> Result<Attribute, ObjectError> {
        let attribute = self.attributes.shift_remove(name).ok_or_else(|| {
            ObjectError::AttributeNotFound {
                object: self.id.to_string(),
                name: name.to_string(),
            }
        })?;
        self.attribute_refs.retain(|_, bound| bound != name);
        Ok(attribute)
    }

    /// Link `child` at `index` (clamped), or at the end when `None`.
    pub(crate) fn link_child(
        &mut self,
        child: &ObjectId,
        index: Option<usize>,
    ) -> Result<(), ObjectError> {
        if self.children.contains(child) {
            return Err(ObjectError::DuplicateChild {
                parent: self.id.to_string(),
                child: child.to_string(),
            });
        }
        match index {
            Some(index) => self.children.insert(index.min(self.children.len()), child.clone()),
            None => self.children.push(child.clone()),
        }
        Ok(())
    }

    /// Returns the index `child` held, or `None` if it was not linked here.
    pub(crate) fn unlink_child(&mut self, child: &ObjectId) -> Option<usize> {
        let index = self.children.iter().position(|id| id == child)?;
        self.children.remove(index);
        Some(index)
    }

    /// Put children into `order`. Children missing from `order` keep their relative order at
    /// the end.
    pub(crate) fn reorder_children(&mut self, order: &[ObjectId]) {
        let mut ordered: Vec<ObjectId> = order
            .iter()
            .filter(|id| self.children.contains(id))
            .cloned()
            .collect();
        ordered.extend(
            self.children
                .iter()
                .filter(|id| !order.contains(id))
                .cloned(),
        );
        self.children = ordered;
    }

    pub(crate) fn bind_attribute(&mut self, field: &str, attribute: &str) {
        self.attribute_refs
            .insert(field.to_string(), attribute.to_string());
    }

    pub(crate) fn bind_child(&mut self, field: &str, child: &ObjectId) {
        self.child_refs.insert(field.to_string(), child.clone());
    }

    pub(crate) fn set_refs(
        &mut self,
        attribute_refs: BTreeMap<String, String>,
        child_refs: BTreeMap<String, ObjectId>,
    ) {
        self.attribute_refs = attribute_refs;
        self.child_refs = child_refs;
    }
}
