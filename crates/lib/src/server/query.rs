//! Read-only tree queries.

use super::{Server, ServerError};
use crate::{
    ObjectId, Result, SObject, Snapshot,
    hierarchy::{self, ParentLookup},
    history::History,
    topic::{TopicKey, Value},
};

impl ParentLookup for Server {
    fn parent_of(&self, id: &ObjectId) -> Result<Option<ObjectId>> {
        Server::parent_of(self, id)
    }
}

impl Server {
    pub fn get_object(&self, id: &ObjectId) -> Result<&SObject> {
        self.objects
            .get(id)
            .ok_or_else(|| ServerError::unknown_object(id).into())
    }

    pub fn try_get_object(&self, id: &ObjectId) -> Option<&SObject> {
        self.objects.get(id)
    }

    pub(crate) fn object_mut(&mut self, id: &ObjectId) -> Result<&mut SObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| ServerError::unknown_object(id).into())
    }

    /// Every live object, sorted by id.
    pub fn get_objects(&self) -> Vec<&SObject> {
        let mut objects: Vec<&SObject> = self.objects.values().collect();
        objects.sort_by(|a, b| a.id().cmp(b.id()));
        objects
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn root(&self) -> Result<&SObject> {
        self.get_object(&ObjectId::root())
    }

    /// Parent of `id`; `None` for the root.
    pub fn parent_of(&self, id: &ObjectId) -> Result<Option<ObjectId>> {
        if id.is_root() {
            return Ok(None);
        }
        if !self.objects.contains_key(id) {
            return Err(ServerError::unknown_object(id).into());
        }
        let parent = self.topics.get(&TopicKey::ParentId(id.clone()))?;
        match parent.as_object_id() {
            Some(parent) => Ok(Some(parent)),
            None => Err(ServerError::TreeCorruption {
                reason: format!("object '{id}' has no parent id"),
            }
            .into()),
        }
    }

    pub fn children_of(&self, id: &ObjectId) -> Result<&[ObjectId]> {
        Ok(self.get_object(id)?.children())
    }

    /// Children of `id` whose type is `type_name`, in child order.
    pub fn get_children_of_type(&self, id: &ObjectId, type_name: &str) -> Result<Vec<&SObject>> {
        let mut matching = Vec::new();
        for child in self.get_object(id)?.children() {
            let object = self.get_object(child)?;
            if object.type_name() == type_name {
                matching.push(object);
            }
        }
        Ok(matching)
    }

    /// `child` if it is a direct child of `parent`.
    pub fn get_child_by_id(&self, parent: &ObjectId, child: &ObjectId) -> Result<Option<&SObject>> {
        if !self.get_object(parent)?.children().contains(child) {
            return Ok(None);
        }
        self.get_object(child).map(Some)
    }

    /// Pre-order search below `start`, which itself is not visited.
    ///
    /// Every visited node for which `accept` holds is returned. Nodes for which `stop` holds
    /// are still visited but their subtrees are not.
    pub fn top_down_search<A, S>(&self, start: &ObjectId, accept: A, stop: S) -> Result<Vec<&SObject>>
    where
        A: Fn(&SObject) -> bool,
        S: Fn(&SObject) -> bool,
    {
        let mut found = Vec::new();
        let mut pending: Vec<&ObjectId> = self.get_object(start)?.children().iter().rev().collect();
        while let Some(id) = pending.pop() {
            let object = self.get_object(id)?;
            if accept(object) {
                found.push(object);
            }
            if !stop(object) {
                pending.extend(object.children().iter().rev());
            }
        }
        Ok(found)
    }

    /// Root-first path to `id`, both ends included.
    pub fn ancestors(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        hierarchy::ancestors(self, id)
    }

    pub fn history(&self, id: &ObjectId) -> Result<&History> {
        Ok(self.get_object(id)?.history())
    }

    /// Snapshot of the subtree rooted at `id`.
    pub fn serialize(&self, id: &ObjectId) -> Result<Snapshot> {
        Snapshot::capture(self, id)
    }

    /// Value of the `_objects` topic: live object id to type name.
    pub fn object_index(&self) -> Result<&Value> {
        self.topics.get(&TopicKey::Objects)
    }
}
