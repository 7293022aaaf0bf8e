//! Events, services and observers.
//!
//! An event is a named, recorded action with a forward handler and an inverse handler. Emitting
//! it runs the forward handler and records an event change carrying both payloads, so undo can
//! hand the inverse payload to the inverse handler. Services are plain request/response calls
//! and are never recorded themselves; whatever they mutate is.

use std::rc::Rc;

use serde::Deserialize;

use super::lifecycle::{CreateRequest, IdPayload, construct_from_payload, decode, teardown_from_payload};
use super::{CreateOptions, Server, ServerError};
use crate::{
    AttributeType, ObjectId, Result,
    constants::{CREATE_OBJECT, DESTROY_OBJECT, REDO, UNDO},
    topic::{Change, Direction, EventKey, TopicKey, Transition, Value},
};

/// Forward or inverse half of an event. Receives the payload, returns the payload for the
/// opposite direction.
pub type EventHandler = Rc<dyn Fn(&mut Server, &Value) -> Result<Value>>;

/// Request/response handler.
pub type ServiceHandler = Rc<dyn Fn(&mut Server, Value) -> Result<Value>>;

/// Called after every change to one topic, including replays.
pub type Observer = Rc<dyn Fn(&Server, &Change)>;

/// Called after every transition is applied, undone or redone.
pub type TransitionCallback = Rc<dyn Fn(&Server, &Transition, Direction)>;

#[derive(Clone)]
pub(crate) struct EventHandlers {
    pub(crate) forward: EventHandler,
    pub(crate) inverse: EventHandler,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryRequest {
    #[serde(default)]
    target: Option<ObjectId>,
}

impl Server {
    /// Register the built-in create/destroy events and the lifecycle and history services.
    pub(crate) fn install_builtins(&mut self) -> Result<()> {
        self.events.insert(
            EventKey::CreateObject,
            EventHandlers {
                forward: Rc::new(construct_from_payload),
                inverse: Rc::new(teardown_from_payload),
            },
        );
        self.events.insert(
            EventKey::DestroyObject,
            EventHandlers {
                forward: Rc::new(teardown_from_payload),
                inverse: Rc::new(construct_from_payload),
            },
        );

        self.register_service(CREATE_OBJECT, |server, payload| {
            let request: CreateRequest = decode(&payload, CREATE_OBJECT)?;
            let options = CreateOptions {
                id: request.id,
                snapshot: request.snapshot,
                args: request.args,
            };
            let info = server.create_object_with(&request.type_name, &request.parent_id, options)?;
            Value::from_serialize(&info)
        })?;
        self.register_service(DESTROY_OBJECT, |server, payload| {
            let IdPayload { id } = decode(&payload, DESTROY_OBJECT)?;
            let info = server.destroy_object(&id)?;
            Value::from_serialize(&info)
        })?;
        self.register_service(UNDO, |server, payload| {
            let request = history_request(&payload, UNDO)?;
            transition_value(server.undo(request.target.as_ref())?)
        })?;
        self.register_service(REDO, |server, payload| {
            let request = history_request(&payload, REDO)?;
            transition_value(server.redo(request.target.as_ref())?)
        })?;
        Ok(())
    }

    /// Register a process-wide event, or an object event when `name` is `a/{id}/{name}`.
    ///
    /// `create_object` and `destroy_object` are reserved.
    pub fn on<F, G>(&mut self, name: &str, forward: F, inverse: G) -> Result<()>
    where
        F: Fn(&mut Server, &Value) -> Result<Value> + 'static,
        G: Fn(&mut Server, &Value) -> Result<Value> + 'static,
    {
        let key: EventKey = name.parse()?;
        match &key {
            EventKey::CreateObject | EventKey::DestroyObject => {
                return Err(ServerError::invalid("on", format!("'{key}' is a built-in event")).into());
            }
            EventKey::Object { object, .. } => {
                self.get_object(object)?;
            }
            EventKey::Named(_) => {}
        }
        self.events.insert(
            key.clone(),
            EventHandlers {
                forward: Rc::new(forward),
                inverse: Rc::new(inverse),
            },
        );
        tracing::debug!(event = %key, "registered event handlers");
        Ok(())
    }

    /// Register handlers for an event owned by object `id`.
    ///
    /// The handlers are dropped when the object is destroyed and must be registered again by
    /// `build` or `post_build` when it is recreated.
    pub fn on_object<F, G>(&mut self, id: &ObjectId, name: &str, forward: F, inverse: G) -> Result<()>
    where
        F: Fn(&mut Server, &Value) -> Result<Value> + 'static,
        G: Fn(&mut Server, &Value) -> Result<Value> + 'static,
    {
        self.on(&EventKey::object(id, name).to_string(), forward, inverse)
    }

    /// Emit an event by name.
    ///
    /// Returns the payload the forward handler produced for the inverse direction.
    pub fn emit(&mut self, name: &str, args: Value) -> Result<Value> {
        let key: EventKey = name.parse()?;
        match key {
            EventKey::Object { object, name } => self.emit_object(&object, &name, args),
            key => {
                if !self.events.contains_key(&key) {
                    return Err(ServerError::UnknownEvent {
                        event: key.to_string(),
                    }
                    .into());
                }
                self.dispatch(key, args)
            }
        }
    }

    /// Emit the event `name` of object `id`.
    ///
    /// The object must declare an event attribute of that name or have handlers registered
    /// for it.
    pub fn emit_object(&mut self, id: &ObjectId, name: &str, args: Value) -> Result<Value> {
        let key = EventKey::object(id, name);
        let declared = self
            .get_object(id)?
            .attribute(name)
            .is_some_and(|attribute| attribute.ty() == AttributeType::Event);
        if !declared && !self.events.contains_key(&key) {
            return Err(ServerError::UnknownEvent {
                event: key.to_string(),
            }
            .into());
        }
        self.dispatch(key, args)
    }

    fn dispatch(&mut self, key: EventKey, args: Value) -> Result<Value> {
        let handlers = self.events.get(&key).cloned();
        self.scoped(|server| {
            let inverse = match &handlers {
                Some(handlers) => server.suppressed(|server| (handlers.forward)(server, &args))?,
                None => Value::Null,
            };
            let change = Change::Event {
                event: key.clone(),
                forward: args,
                inverse: inverse.clone(),
            };
            if let EventKey::Object { object, name } = &key {
                server.notify(&TopicKey::attribute(object, name.as_str()), &change);
            }
            // without an inverse handler there is nothing to undo
            if handlers.is_some() {
                server.topics.record_event(change);
            }
            tracing::debug!(event = %key, "emitted event");
            Ok(inverse)
        })
    }

    pub(crate) fn event_handlers(&self, key: &EventKey) -> Result<EventHandlers> {
        self.events.get(key).cloned().ok_or_else(|| {
            ServerError::UnknownEvent {
                event: key.to_string(),
            }
            .into()
        })
    }

    pub fn has_event(&self, name: &str) -> bool {
        name.parse::<EventKey>()
            .is_ok_and(|key| self.events.contains_key(&key))
    }

    /// Register a request/response service.
    pub fn register_service<F>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(&mut Server, Value) -> Result<Value> + 'static,
    {
        if self.services.contains_key(name) {
            return Err(ServerError::invalid(
                "register_service",
                format!("service '{name}' is already registered"),
            )
            .into());
        }
        self.services.insert(name.to_string(), Rc::new(handler));
        tracing::debug!(service = name, "registered service");
        Ok(())
    }

    /// Call a service. This is the entry point for requests arriving from a transport.
    pub fn call_service(&mut self, name: &str, payload: Value) -> Result<Value> {
        let handler = self.services.get(name).cloned().ok_or_else(|| {
            ServerError::UnknownService {
                service: name.to_string(),
            }
        })?;
        tracing::trace!(service = name, "calling service");
        handler(self, payload)
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Call `f` after every change to the topic `key`.
    pub fn observe<F>(&mut self, key: TopicKey, f: F) -> Result<()>
    where
        F: Fn(&Server, &Change) + 'static,
    {
        self.topics.topic(&key)?;
        self.observers.entry(key).or_default().push(Rc::new(f));
        Ok(())
    }

    /// Call `f` after every transition is applied, undone or redone.
    pub fn on_transition<F>(&mut self, f: F)
    where
        F: Fn(&Server, &Transition, Direction) + 'static,
    {
        self.transition_callbacks.push(Rc::new(f));
    }
}

fn history_request(payload: &Value, operation: &str) -> Result<HistoryRequest> {
    if payload.is_null() {
        return Ok(HistoryRequest::default());
    }
    decode(payload, operation)
}

fn transition_value(transition: Option<Transition>) -> Result<Value> {
    match transition {
        Some(transition) => Value::from_serialize(&transition),
        None => Ok(Value::Null),
    }
}
