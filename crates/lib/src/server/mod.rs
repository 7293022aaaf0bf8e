//! The server: object arena, type registry and transition routing.
//!
//! The [`Server`] owns every [`SObject`] and the [`TopicStore`] holding their state. All tree
//! edits run through it:
//!
//! - create and destroy are recorded as invertible `create_object` / `destroy_object` events
//!   whose payloads carry full snapshots, so undo and redo restore subtrees exactly;
//! - attribute, parent and tag edits are topic mutations, recorded as structured changes;
//! - every finished transition is routed to the history of the lowest common ancestor of the
//!   objects it touches and to every ancestor of that node up to the root.
//!
//! Mutation is single threaded and runs to completion. The server is `!Send`.

mod config;
mod errors;
mod events;
mod lifecycle;
mod nodes;
mod query;
mod record;
mod registry;
mod routing;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use events::{EventHandler, Observer, ServiceHandler, TransitionCallback};
pub use lifecycle::{CreateInfo, CreateOptions, CreateRequest, DestroyInfo};
pub use record::Recording;

use crate::{
    Clock, ObjectId, Result, SObject, SystemClock,
    constants::{ROOT_ID, ROOT_TYPE},
    id::IdGenerator,
    object::RootObject,
    topic::{Change, EventKey, Mutation, TopicKey, TopicKind, TopicStore, Value},
};

/// Orchestrates the object tree.
pub struct Server {
    config: ServerConfig,
    clock: Rc<dyn Clock>,
    ids: IdGenerator,
    topics: TopicStore,
    objects: HashMap<ObjectId, SObject>,
    /// Ids destroyed and not recreated since, for `AlreadyDestroyed`.
    tombstones: HashSet<ObjectId>,
    types: registry::TypeRegistry,
    events: HashMap<EventKey, events::EventHandlers>,
    services: HashMap<String, ServiceHandler>,
    observers: HashMap<TopicKey, Vec<Observer>>,
    transition_callbacks: Vec<TransitionCallback>,
    /// Index a child held under each parent it was unlinked from, keyed `(child, parent)`.
    /// Consumed when the child is linked there again.
    positions: HashMap<(ObjectId, ObjectId), usize>,
    /// True while undo or redo replays a transition.
    replaying: bool,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("objects", &self.objects.len())
            .field("topics", &self.topics.len())
            .field("types", &self.types.len())
            .finish()
    }
}

impl Server {
    /// Create a server with the default configuration and the system clock.
    pub fn new() -> Result<Self> {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Result<Self> {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    /// Create a server reading time from `clock`, for reproducible ids and timestamps.
    pub fn with_clock(config: ServerConfig, clock: Rc<dyn Clock>) -> Result<Self> {
        let mut server = Self {
            config,
            clock,
            ids: IdGenerator::new(),
            topics: TopicStore::new(),
            objects: HashMap::new(),
            tombstones: HashSet::new(),
            types: registry::TypeRegistry::default(),
            events: HashMap::new(),
            services: HashMap::new(),
            observers: HashMap::new(),
            transition_callbacks: Vec::new(),
            positions: HashMap::new(),
            replaying: false,
        };
        server.startup()?;
        Ok(server)
    }

    /// Register the root type, create the root object and install built-in events and services.
    fn startup(&mut self) -> Result<()> {
        self.register_as::<RootObject>(ROOT_TYPE)?;
        self.topics.add_topic(
            TopicKey::Objects,
            TopicKind::Map,
            Some(Value::map([(ROOT_ID, ROOT_TYPE)])),
            false,
        )?;
        let root = ObjectId::root();
        self.topics
            .add_topic(TopicKey::Tags(root.clone()), TopicKind::Set, None, false)?;
        let mut object = SObject::new(
            root.clone(),
            ROOT_TYPE.to_string(),
            Rc::new(RootObject),
            &self.config.history,
        );
        object.set_linked(true);
        self.objects.insert(root, object);
        self.install_builtins()?;
        tracing::debug!(max_history = self.config.history.max_depth, "server started");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Read-only access to the topic store.
    pub fn topics(&self) -> &TopicStore {
        &self.topics
    }

    /// Current value of any topic.
    pub fn get(&self, key: &TopicKey) -> Result<&Value> {
        self.topics.get(key)
    }

    /// Register a process-wide topic, such as one a transport mirrors from its clients.
    ///
    /// Object-owned topics are created by the server itself and cannot be added here.
    pub fn add_topic(
        &mut self,
        key: TopicKey,
        kind: TopicKind,
        init: Option<Value>,
        stateful: bool,
    ) -> Result<()> {
        if !matches!(key, TopicKey::Named(_)) {
            return Err(ServerError::invalid(
                "add_topic",
                format!("'{key}' is managed by the server"),
            )
            .into());
        }
        self.topics.add_topic(key, kind, init, stateful)
    }

    /// Apply a mutation to a topic as its own transition (or as part of an open recording).
    ///
    /// This is also the entry point for changes arriving from a transport.
    pub fn mutate(&mut self, key: &TopicKey, mutation: Mutation) -> Result<Option<Change>> {
        self.scoped(|server| server.mutate_in_scope(key, mutation))
    }

    /// Mutate and react, without opening a scope of its own.
    pub(crate) fn mutate_in_scope(
        &mut self,
        key: &TopicKey,
        mutation: Mutation,
    ) -> Result<Option<Change>> {
        let change = self.topics.mutate(key, mutation)?;
        if let Some(change) = &change {
            self.react(change)?;
        }
        Ok(change)
    }

    /// Keep the tree in sync with a change that has just been applied to the store, then
    /// notify observers.
    pub(crate) fn react(&mut self, change: &Change) -> Result<()> {
        if let Change::Set {
            topic: TopicKey::ParentId(id),
            old,
            new,
        } = change
        {
            self.relink(id, old.as_object_id().as_ref(), new.as_object_id().as_ref())?;
        }
        if let Some(key) = change.topic() {
            self.notify(key, change);
        }
        Ok(())
    }

    fn relink(
        &mut self,
        id: &ObjectId,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
    ) -> Result<()> {
        if !self.objects.get(id).is_some_and(SObject::is_linked) {
            return Ok(());
        }
        if let Some(old) = old
            && !self.detach(old, id)
        {
            tracing::warn!(%id, parent = %old, "reparent: object was not a child of its old parent");
        }
        if let Some(new) = new {
            self.attach(new, id)?;
        }
        tracing::debug!(%id, old = ?old, new = ?new, "reparented object");
        Ok(())
    }

    /// Unlink `child` from `parent`, remembering its index there. False if it was not linked.
    pub(crate) fn detach(&mut self, parent: &ObjectId, child: &ObjectId) -> bool {
        let Some(index) = self
            .objects
            .get_mut(parent)
            .and_then(|object| object.unlink_child(child))
        else {
            return false;
        };
        self.positions.insert((child.clone(), parent.clone()), index);
        true
    }

    /// Link `child` under `parent`. Replay puts it back at the index it last held there;
    /// anything else appends.
    pub(crate) fn attach(&mut self, parent: &ObjectId, child: &ObjectId) -> Result<()> {
        let remembered = self.positions.remove(&(child.clone(), parent.clone()));
        let index = remembered.filter(|_| self.replaying);
        self.objects
            .get_mut(parent)
            .filter(|object| !object.is_destroyed())
            .ok_or_else(|| ServerError::unknown_object(parent))?
            .link_child(child, index)?;
        Ok(())
    }

    pub(crate) fn notify(&self, key: &TopicKey, change: &Change) {
        if let Some(observers) = self.observers.get(key) {
            for observer in observers {
                observer(self, change);
            }
        }
    }

    /// Run `f` inside a grouping scope; the outermost scope finalizes and routes the
    /// transition even when `f` fails.
    pub(crate) fn scoped<T>(&mut self, f: impl FnOnce(&mut Server) -> Result<T>) -> Result<T> {
        self.topics.begin();
        let result = f(self);
        let finished = self.finish_scope();
        let value = result?;
        finished?;
        Ok(value)
    }

    /// Run `f` with recording suppressed.
    pub(crate) fn suppressed<T>(
        &mut self,
        f: impl FnOnce(&mut Server) -> Result<T>,
    ) -> Result<T> {
        self.topics.suppress();
        let result = f(self);
        self.topics.unsuppress();
        result
    }

    pub(crate) fn finish_scope(&mut self) -> Result<()> {
        let timestamp = self.clock.now_millis();
        match self.topics.end(timestamp) {
            Some(transition) => self.route(transition),
            None => Ok(()),
        }
    }

    pub(crate) fn next_id(&mut self) -> ObjectId {
        self.ids.next_id(self.clock.as_ref())
    }
}
