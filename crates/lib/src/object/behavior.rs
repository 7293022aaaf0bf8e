//! Object types and the build context they declare their structure through.

use super::{Attribute, AttributeType, ObjAttribute, ObjectError};
use crate::{ObjectId, Result, Server, topic::Value};

/// Behavior of a registered object type.
///
/// `build` runs only when an object is created fresh; it declares attributes, creates
/// children and binds named references through the [`BuildContext`]. When an object is
/// restored from a snapshot, its attributes, children and reference bindings come from the
/// snapshot and `build` is skipped. `post_build` runs last on both paths and is the place to
/// wire observers and event handlers.
///
/// ```
/// use objectsync::{AttributeType, BuildContext, ObjectId, ObjectType, Result, Server, Value};
///
/// #[derive(Default)]
/// struct Counter;
///
/// impl ObjectType for Counter {
///     fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
///         let count = ctx.add_attribute("count", AttributeType::Int, Some(Value::from(0)))?;
///         ctx.bind_attribute("count", &count)
///     }
/// }
///
/// let mut server = Server::new()?;
/// server.register::<Counter>()?;
/// let id = server.create_object("Counter", &ObjectId::root())?;
/// let count = server.get_attribute(&id, "count")?;
/// count.set(&mut server, 3)?;
/// assert_eq!(count.get(&server)?, &Value::from(3));
/// # Ok::<(), objectsync::Error>(())
/// ```
pub trait ObjectType: 'static {
    /// Registered name. Defaults to the last path segment of the Rust type name.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Declare attributes and children of a freshly created object.
    fn build(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Final hook on both the fresh and the restore path.
    fn post_build(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Access to the object under construction.
pub struct BuildContext<'a> {
    server: &'a mut Server,
    id: ObjectId,
    args: Value,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(server: &'a mut Server, id: ObjectId, args: Value) -> Self {
        Self { server, id, args }
    }

    /// Id of the object being built.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Build arguments passed to `create_object_with`. Null on restore.
    pub fn args(&self) -> &Value {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub fn server(&mut self) -> &mut Server {
        self.server
    }

    pub fn server_ref(&self) -> &Server {
        self.server
    }

    /// Declare a stateful attribute (event attributes are never stateful).
    pub fn add_attribute(
        &mut self,
        name: &str,
        ty: AttributeType,
        init: Option<Value>,
    ) -> Result<Attribute> {
        let stateful = ty != AttributeType::Event;
        self.server.add_attribute(&self.id, name, ty, init, stateful)
    }

    /// Declare an attribute that is neither recorded nor snapshotted with a value.
    pub fn add_transient_attribute(
        &mut self,
        name: &str,
        ty: AttributeType,
        init: Option<Value>,
    ) -> Result<Attribute> {
        self.server.add_attribute(&self.id, name, ty, init, false)
    }

    /// Declare an object-reference attribute.
    pub fn add_obj_attribute(
        &mut self,
        name: &str,
        ty: AttributeType,
        init: Option<Value>,
    ) -> Result<ObjAttribute> {
        if !ty.is_reference() {
            return Err(ObjectError::InvalidAttributeType {
                object: self.id.to_string(),
                name: name.to_string(),
                expected: AttributeType::Obj.to_string(),
                actual: ty.to_string(),
            }
            .into());
        }
        ObjAttribute::try_from(self.add_attribute(name, ty, init)?)
    }

    /// Create a child of the object being built.
    pub fn add_child(&mut self, type_name: &str, args: Value) -> Result<ObjectId> {
        self.server.build_child(&self.id, type_name, args)
    }

    /// Create a child of a statically known type.
    pub fn add_child_of<T: super::ObjectType>(&mut self, args: Value) -> Result<ObjectId> {
        self.add_child(T::type_name(), args)
    }

    /// Record that `field` refers to `attribute`, so a restored object can find it by field.
    pub fn bind_attribute(&mut self, field: &str, attribute: &Attribute) -> Result<()> {
        let owned = attribute.object() == &self.id
            && self.server.has_attribute(&self.id, attribute.name())?;
        if !owned {
            return Err(self.unresolved(field, attribute.name()));
        }
        self.server
            .object_mut(&self.id)?
            .bind_attribute(field, attribute.name());
        Ok(())
    }

    /// Record that `field` refers to the child `child`.
    pub fn bind_child(&mut self, field: &str, child: &ObjectId) -> Result<()> {
        if !self.server.get_object(&self.id)?.children().contains(child) {
            return Err(self.unresolved(field, child));
        }
        self.server.object_mut(&self.id)?.bind_child(field, child);
        Ok(())
    }

    /// Attribute bound to `field`.
    pub fn bound_attribute(&self, field: &str) -> Option<Attribute> {
        let object = self.server.try_get_object(&self.id)?;
        object
            .attribute_refs()
            .get(field)
            .and_then(|name| object.attribute(name))
            .cloned()
    }

    /// Child bound to `field`.
    pub fn bound_child(&self, field: &str) -> Option<ObjectId> {
        self.server
            .try_get_object(&self.id)?
            .child_refs()
            .get(field)
            .cloned()
    }

    pub fn attribute(&self, name: &str) -> Result<Attribute> {
        self.server.get_attribute(&self.id, name)
    }

    pub fn obj_attribute(&self, name: &str) -> Result<ObjAttribute> {
        ObjAttribute::try_from(self.attribute(name)?)
    }

    /// Register a recorded event on this object. See [`Server::on_object`].
    pub fn on<F, G>(&mut self, name: &str, forward: F, inverse: G) -> Result<()>
    where
        F: Fn(&mut Server, &Value) -> Result<Value> + 'static,
        G: Fn(&mut Server, &Value) -> Result<Value> + 'static,
    {
        self.server.on_object(&self.id, name, forward, inverse)
    }

    fn unresolved(&self, field: &str, target: &str) -> crate::Error {
        ObjectError::UnresolvedReference {
            object: self.id.to_string(),
            field: field.to_string(),
            target: target.to_string(),
        }
        .into()
    }
}

/// The built-in root object type.
#[derive(Debug, Default)]
pub struct RootObject;

impl ObjectType for RootObject {
    fn type_name() -> &'static str {
        crate::constants::ROOT_TYPE
    }
}
