//! Object lifecycle: create, destroy, reparent.
//!
//! Construction and teardown run with recording suppressed. The public operations wrap them
//! in a single `create_object` / `destroy_object` event change whose two payloads are enough to
//! redo and undo the whole operation: `{id}` on one side and a full create request carrying
//! the subtree snapshot on the other.

use std::rc::Rc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{Server, ServerError};
use crate::{
    AttributeType, ObjectId, Result, SObject, Snapshot,
    constants::{CREATE_OBJECT, DESTROY_OBJECT},
    hierarchy,
    object::{BuildContext, ObjectError, ObjectType},
    topic::{Change, EventKey, Mutation, TopicKey, TopicKind, Value},
};

/// Payload of a `create_object` event or service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(rename = "type")]
    pub type_name: String,
    pub parent_id: ObjectId,
    /// Generated when absent. A snapshot's id takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Restore from this snapshot instead of running `build`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    /// Build arguments, handed to `ObjectType::build`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

/// Optional parts of a create call.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub id: Option<ObjectId>,
    pub snapshot: Option<Snapshot>,
    pub args: Value,
}

/// Result of a create: what was made and its snapshot right after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInfo {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub parent_id: ObjectId,
    pub snapshot: Snapshot,
}

/// Result of a destroy: everything needed to create the object again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestroyInfo {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub type_name: String,
    /// `None` only for an object that never got its parent topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    pub snapshot: Snapshot,
}

impl DestroyInfo {
    /// The create request that restores this object.
    pub fn create_request(&self) -> Option<CreateRequest> {
        Some(CreateRequest {
            type_name: self.type_name.clone(),
            parent_id: self.parent_id.clone()?,
            id: Some(self.id.clone()),
            snapshot: Some(self.snapshot.clone()),
            args: Value::Null,
        })
    }
}

pub(crate) fn id_payload(id: &ObjectId) -> Value {
    Value::map([("id", id)])
}

/// Decode an event or service payload.
pub(crate) fn decode<T: DeserializeOwned>(payload: &Value, operation: &str) -> Result<T> {
    payload.deserialize_into().map_err(|err| {
        ServerError::MalformedPayload {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

#[derive(Deserialize)]
pub(crate) struct IdPayload {
    pub(crate) id: ObjectId,
}

/// Event handler constructing an object from a create request. Returns `{id}`.
pub(crate) fn construct_from_payload(server: &mut Server, payload: &Value) -> Result<Value> {
    let request: CreateRequest = decode(payload, CREATE_OBJECT)?;
    let id = server.construct_node(request)?;
    Ok(id_payload(&id))
}

/// Event handler tearing down `{id}`. Returns the create request restoring it.
pub(crate) fn teardown_from_payload(server: &mut Server, payload: &Value) -> Result<Value> {
    let IdPayload { id } = decode(payload, DESTROY_OBJECT)?;
    let info = server.teardown(&id)?;
    match info.create_request() {
        Some(request) => Value::from_serialize(&request),
        None => Ok(Value::Null),
    }
}

impl Server {
    /// Create an object of a registered type under `parent_id` with a generated id.
    pub fn create_object(&mut self, type_name: &str, parent_id: &ObjectId) -> Result<ObjectId> {
        Ok(self
            .create_object_with(type_name, parent_id, CreateOptions::default())?
            .id)
    }

    /// Create an object, optionally with a fixed id, from a snapshot, or with build arguments.
    ///
    /// Recorded as one `create_object` event; undo destroys the object and redo restores it
    /// from the snapshot captured here, including any children `build` created.
    pub fn create_object_with(
        &mut self,
        type_name: &str,
        parent_id: &ObjectId,
        options: CreateOptions,
    ) -> Result<CreateInfo> {
        let request = CreateRequest {
            type_name: type_name.to_string(),
            parent_id: parent_id.clone(),
            id: options.id,
            snapshot: options.snapshot,
            args: options.args,
        };
        self.scoped(|server| {
            let info = server.suppressed(|server| server.construct(request))?;
            let forward = CreateRequest {
                type_name: info.type_name.clone(),
                parent_id: info.parent_id.clone(),
                id: Some(info.id.clone()),
                snapshot: Some(info.snapshot.clone()),
                args: Value::Null,
            };
            server.topics.record_event(Change::Event {
                event: EventKey::CreateObject,
                forward: Value::from_serialize(&forward)?,
                inverse: id_payload(&info.id),
            });
            tracing::debug!(id = %info.id, type_name = %info.type_name, parent = %info.parent_id, "created object");
            Ok(info)
        })
    }

    /// Destroy an object and its whole subtree.
    ///
    /// Recorded as one `destroy_object` event whose inverse recreates the subtree from the
    /// returned snapshot.
    pub fn destroy_object(&mut self, id: &ObjectId) -> Result<DestroyInfo> {
        self.scoped(|server| {
            let info = server.suppressed(|server| server.teardown(id))?;
            match info.create_request() {
                Some(request) => server.topics.record_event(Change::Event {
                    event: EventKey::DestroyObject,
                    forward: id_payload(id),
                    inverse: Value::from_serialize(&request)?,
                }),
                None => tracing::debug!(%id, "destroyed object had no parent, not recorded"),
            }
            tracing::debug!(%id, type_name = %info.type_name, "destroyed object");
            Ok(info)
        })
    }

    /// Create a child of `parent` with a fresh id.
    pub fn add_child(&mut self, parent: &ObjectId, type_name: &str, args: Value) -> Result<ObjectId> {
        let options = CreateOptions {
            args,
            ..CreateOptions::default()
        };
        Ok(self.create_object_with(type_name, parent, options)?.id)
    }

    /// Destroy `child`, which must be a child of `parent`.
    pub fn remove_child(&mut self, parent: &ObjectId, child: &ObjectId) -> Result<DestroyInfo> {
        if !self.get_object(parent)?.children().contains(child) {
            return Err(ServerError::invalid(
                "remove_child",
                format!("'{child}' is not a child of '{parent}'"),
            )
            .into());
        }
        self.destroy_object(child)
    }

    /// Destroy an object. Same as [`Server::destroy_object`].
    pub fn remove(&mut self, id: &ObjectId) -> Result<DestroyInfo> {
        self.destroy_object(id)
    }

    /// Move `id` under `new_parent`.
    ///
    /// Recorded as a change of the `parent_id/{id}` topic, which touches both the old and the
    /// new parent's subtree.
    pub fn set_parent(&mut self, id: &ObjectId, new_parent: &ObjectId) -> Result<()> {
        if id.is_root() {
            return Err(ServerError::invalid("set_parent", "the root object cannot be moved").into());
        }
        self.get_object(id)?;
        self.get_object(new_parent)?;
        if hierarchy::ancestors(self, new_parent)?.contains(id) {
            return Err(ServerError::invalid(
                "set_parent",
                format!("'{new_parent}' is inside the subtree of '{id}'"),
            )
            .into());
        }
        self.mutate(
            &TopicKey::ParentId(id.clone()),
            Mutation::Set(Value::from(new_parent)),
        )?;
        Ok(())
    }

    /// Construct a node and capture its snapshot.
    pub(crate) fn construct(&mut self, request: CreateRequest) -> Result<CreateInfo> {
        let type_name = request.type_name.clone();
        let parent_id = request.parent_id.clone();
        let id = self.construct_node(request)?;
        let snapshot = Snapshot::capture(self, &id)?;
        Ok(CreateInfo {
            id,
            type_name,
            parent_id,
            snapshot,
        })
    }

    /// Build or restore one node and its subtree.
    ///
    /// On any failure the half-built node is torn down before the error is returned.
    pub(crate) fn construct_node(&mut self, request: CreateRequest) -> Result<ObjectId> {
        let CreateRequest {
            type_name,
            parent_id,
            id,
            snapshot,
            args,
        } = request;
        if let Some(snapshot) = &snapshot
            && snapshot.type_name != type_name
        {
            return Err(ServerError::invalid(
                CREATE_OBJECT,
                format!(
                    "snapshot of type '{}' cannot create '{type_name}'",
                    snapshot.type_name
                ),
            )
            .into());
        }
        let factory = self.types.factory(&type_name)?;
        let id = match (id, &snapshot) {
            (Some(id), Some(snapshot)) if id != snapshot.id => {
                return Err(ServerError::invalid(
                    CREATE_OBJECT,
                    format!("id '{id}' does not match snapshot id '{}'", snapshot.id),
                )
                .into());
            }
            (_, Some(snapshot)) => snapshot.id.clone(),
            (Some(id), None) => id,
            (None, None) => self.next_id(),
        };
        if !id.is_valid() {
            return Err(ServerError::invalid(CREATE_OBJECT, format!("invalid object id '{id}'")).into());
        }
        if id.is_root() || self.objects.contains_key(&id) {
            return Err(ObjectError::DuplicateChild {
                parent: parent_id.to_string(),
                child: id.to_string(),
            }
            .into());
        }

        let behavior = factory();
        self.objects.insert(
            id.clone(),
            SObject::new(
                id.clone(),
                type_name.clone(),
                Rc::clone(&behavior),
                &self.config.history,
            ),
        );
        self.tombstones.remove(&id);

        let populated = self.populate(&id, &type_name, &parent_id, snapshot.as_ref(), args, behavior);
        if let Err(err) = populated {
            tracing::warn!(%id, %type_name, error = %err, "construction failed, tearing down");
            if let Err(teardown_err) = self.teardown(&id) {
                tracing::error!(%id, error = %teardown_err, "teardown of half-built object failed");
            }
            self.tombstones.remove(&id);
            return Err(err);
        }
        tracing::trace!(%id, %type_name, restored = snapshot.is_some(), "constructed object");
        Ok(id)
    }

    fn populate(
        &mut self,
        id: &ObjectId,
        type_name: &str,
        parent_id: &ObjectId,
        snapshot: Option<&Snapshot>,
        args: Value,
        behavior: Rc<dyn ObjectType>,
    ) -> Result<()> {
        self.topics.add_topic(
            TopicKey::ParentId(id.clone()),
            TopicKind::String,
            Some(Value::from(parent_id)),
            true,
        )?;
        self.topics
            .add_topic(TopicKey::Tags(id.clone()), TopicKind::Set, None, false)?;

        let post_args = match snapshot {
            Some(snapshot) => {
                self.restore(id, snapshot)?;
                Value::Null
            }
            None => {
                behavior.build(&mut BuildContext::new(self, id.clone(), args.clone()))?;
                args
            }
        };

        self.link(id, parent_id)?;
        self.mutate_in_scope(
            &TopicKey::Objects,
            Mutation::Add {
                key: id.to_string(),
                value: Value::from(type_name),
            },
        )?;
        behavior.post_build(&mut BuildContext::new(self, id.clone(), post_args))
    }

    /// Recreate attributes, reference tables and children from a snapshot.
    fn restore(&mut self, id: &ObjectId, snapshot: &Snapshot) -> Result<()> {
        for attribute in &snapshot.attributes {
            let init = (attribute.ty != AttributeType::Event).then(|| attribute.value.clone());
            self.add_attribute(id, &attribute.name, attribute.ty, init, attribute.is_stateful)?;
        }
        self.object_mut(id)?
            .set_refs(snapshot.attribute_refs.clone(), snapshot.child_refs.clone());

        // creation order first, so build-time sibling assumptions hold; then live order
        for child in snapshot.children_by_id() {
            self.construct_node(CreateRequest {
                type_name: child.type_name.clone(),
                parent_id: id.clone(),
                id: Some(child.id.clone()),
                snapshot: Some(child.clone()),
                args: Value::Null,
            })?;
        }
        let order: Vec<ObjectId> = snapshot.children.keys().cloned().collect();
        self.object_mut(id)?.reorder_children(&order);
        Ok(())
    }

    /// Create a child during `build`, without a snapshot capture.
    pub(crate) fn build_child(
        &mut self,
        parent: &ObjectId,
        type_name: &str,
        args: Value,
    ) -> Result<ObjectId> {
        self.suppressed(|server| {
            server.construct_node(CreateRequest {
                type_name: type_name.to_string(),
                parent_id: parent.clone(),
                id: None,
                snapshot: None,
                args,
            })
        })
    }

    fn link(&mut self, id: &ObjectId, parent_id: &ObjectId) -> Result<()> {
        self.attach(parent_id, id)?;
        self.object_mut(id)?.set_linked(true);
        Ok(())
    }

    /// Tear down a node and its subtree. Returns what is needed to recreate it.
    pub(crate) fn teardown(&mut self, id: &ObjectId) -> Result<DestroyInfo> {
        if id.is_root() {
            return Err(ServerError::invalid(DESTROY_OBJECT, "the root object cannot be destroyed").into());
        }
        match self.objects.get(id) {
            Some(object) if !object.is_destroyed() => {}
            Some(_) => return Err(ServerError::AlreadyDestroyed { id: id.to_string() }.into()),
            None if self.tombstones.contains(id) => {
                return Err(ServerError::AlreadyDestroyed { id: id.to_string() }.into());
            }
            None => return Err(ServerError::unknown_object(id).into()),
        }

        let snapshot = Snapshot::capture(self, id)?;
        let parent_id = self
            .topics
            .get(&TopicKey::ParentId(id.clone()))
            .ok()
            .and_then(Value::as_object_id);
        let object = self.object_mut(id)?;
        object.mark_destroyed();
        let type_name = object.type_name().to_string();
        let children = object.children().to_vec();
        let attributes: Vec<_> = object.attributes().cloned().collect();
        let linked = object.is_linked();

        for child in children.iter().rev() {
            self.teardown(child)?;
        }

        for attribute in &attributes {
            if let Err(err) = self.topics.remove_topic(&attribute.key()) {
                tracing::warn!(%id, attribute = attribute.name(), error = %err, "attribute topic already gone");
            }
        }
        for key in [TopicKey::ParentId(id.clone()), TopicKey::Tags(id.clone())] {
            // both may be missing when construction failed early
            let _ = self.topics.remove_topic(&key);
        }
        self.observers.retain(|key, _| key.owner() != Some(id));
        self.events.retain(|key, _| key.owner() != Some(id));

        match (&parent_id, linked) {
            (Some(parent_id), true) => {
                if !self.detach(parent_id, id) {
                    tracing::warn!(%id, parent = %parent_id, "object missing from its parent's children");
                }
            }
            _ => tracing::warn!(%id, "object was never linked into its parent"),
        }

        let listed = self
            .topics
            .get(&TopicKey::Objects)?
            .get(id.as_str())
            .is_some();
        if listed {
            self.mutate_in_scope(
                &TopicKey::Objects,
                Mutation::Delete {
                    key: id.to_string(),
                },
            )?;
        }

        self.objects.remove(id);
        self.tombstones.insert(id.clone());
        tracing::trace!(%id, %type_name, "tore down object");
        Ok(DestroyInfo {
            id: id.clone(),
            type_name,
            parent_id,
            snapshot,
        })
    }
}
