use objectsync::{
    AttributeType, BuildContext, ObjectId, ObjectType, Result, Server, ServerConfig, Value,
    server::ServerError,
};

// ==========================
// TEST OBJECT TYPES
// ==========================

/// A single integer attribute `count`, starting at zero.
#[derive(Debug, Default)]
pub struct Counter;

impl ObjectType for Counter {
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let init = ctx.arg("count").cloned().or(Some(Value::from(0)));
        let count = ctx.add_attribute("count", AttributeType::Int, init)?;
        ctx.bind_attribute("count", &count)
    }
}

/// A container with a `style` dict and a `label`.
#[derive(Debug, Default)]
pub struct Folder;

impl ObjectType for Folder {
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.add_attribute("style", AttributeType::Map, None)?;
        ctx.add_attribute("label", AttributeType::String, None)?;
        Ok(())
    }
}

/// Builds two counters of its own, bound as `left` and `right`.
#[derive(Debug, Default)]
pub struct Pair;

impl ObjectType for Pair {
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.add_attribute("label", AttributeType::String, Some(Value::from("pair")))?;
        let left = ctx.add_child_of::<Counter>(Value::Null)?;
        let right = ctx.add_child_of::<Counter>(Value::map([("count", 10)]))?;
        ctx.bind_child("left", &left)?;
        ctx.bind_child("right", &right)
    }
}

/// One attribute of every reference type.
#[derive(Debug, Default)]
pub struct Linker;

impl ObjectType for Linker {
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.add_obj_attribute("target", AttributeType::Obj, None)?;
        ctx.add_obj_attribute("items", AttributeType::ObjList, None)?;
        ctx.add_obj_attribute("members", AttributeType::ObjSet, None)?;
        ctx.add_obj_attribute("named", AttributeType::ObjMap, None)?;
        Ok(())
    }
}

/// A `click` event that increments `clicks`; undo decrements it.
#[derive(Debug, Default)]
pub struct Clicker;

impl ObjectType for Clicker {
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.add_attribute("clicks", AttributeType::Int, None)?;
        ctx.add_attribute("click", AttributeType::Event, None)?;
        Ok(())
    }

    // handlers are dropped on destroy, so register them on both build paths
    fn post_build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let forward_id = ctx.id().clone();
        let inverse_id = ctx.id().clone();
        ctx.on(
            "click",
            move |server, payload| {
                bump(server, &forward_id, 1)?;
                Ok(payload.clone())
            },
            move |server, payload| {
                bump(server, &inverse_id, -1)?;
                Ok(payload.clone())
            },
        )
    }
}

fn bump(server: &mut Server, id: &ObjectId, delta: i64) -> Result<()> {
    let clicks = server.get_attribute(id, "clicks")?;
    let current = clicks.get(server)?.as_int().unwrap_or(0);
    clicks.set(server, current + delta)
}

/// Declares an attribute and a child, then fails.
#[derive(Debug, Default)]
pub struct Broken;

impl ObjectType for Broken {
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.add_attribute("half", AttributeType::Int, None)?;
        ctx.add_child_of::<Counter>(Value::Null)?;
        Err(ServerError::InvalidOperation {
            operation: "build".to_string(),
            reason: "broken on purpose".to_string(),
        }
        .into())
    }
}

// ==========================
// CORE TEST FACTORIES
// ==========================

/// Server with every test type registered.
pub fn test_server() -> Server {
    test_server_with(ServerConfig::default())
}

pub fn test_server_with(config: ServerConfig) -> Server {
    let mut server = Server::with_config(config).expect("Failed to create server");
    register_all(&mut server);
    server
}

pub fn register_all(server: &mut Server) {
    server.register::<Counter>().expect("Failed to register Counter");
    server.register::<Folder>().expect("Failed to register Folder");
    server.register::<Pair>().expect("Failed to register Pair");
    server.register::<Linker>().expect("Failed to register Linker");
    server.register::<Clicker>().expect("Failed to register Clicker");
    server.register::<Broken>().expect("Failed to register Broken");
}

pub fn root() -> ObjectId {
    ObjectId::root()
}

pub fn create(server: &mut Server, type_name: &str, parent: &ObjectId) -> ObjectId {
    server
        .create_object(type_name, parent)
        .unwrap_or_else(|e| panic!("Failed to create {type_name} under {parent}: {e}"))
}

/// Current value of an attribute.
pub fn value(server: &Server, id: &ObjectId, name: &str) -> Value {
    server
        .attribute_value(id, name)
        .unwrap_or_else(|e| panic!("Failed to read {name} of {id}: {e}"))
        .clone()
}

pub fn set(server: &mut Server, id: &ObjectId, name: &str, new_value: impl Into<Value>) {
    server
        .get_attribute(id, name)
        .and_then(|attribute| attribute.set(server, new_value))
        .unwrap_or_else(|e| panic!("Failed to set {name} of {id}: {e}"));
}

pub fn children(server: &Server, id: &ObjectId) -> Vec<ObjectId> {
    server
        .children_of(id)
        .expect("Failed to read children")
        .to_vec()
}

pub fn history_len(server: &Server, id: &ObjectId) -> usize {
    server.history(id).expect("Failed to read history").len()
}
