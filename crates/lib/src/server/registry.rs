//! Object type registry.
//!
//! Snapshots and transport messages name types by string; the registry is the single map from
//! those names to factories producing the type's behavior.

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Server, ServerError};
use crate::{Result, object::ObjectType};

pub(crate) type Factory = Rc<dyn Fn() -> Rc<dyn ObjectType>>;

struct Registration {
    type_id: TypeId,
    factory: Factory,
}

#[derive(Default)]
pub(crate) struct TypeRegistry {
    by_name: IndexMap<String, Registration>,
    by_type: HashMap<TypeId, String>,
}

impl TypeRegistry {
    fn insert(&mut self, name: &str, type_id: TypeId, factory: Factory) -> Result<()> {
        if self.by_name.contains_key(name) || self.by_type.contains_key(&type_id) {
            return Err(ServerError::DuplicateTypeRegistration {
                type_name: name.to_string(),
            }
            .into());
        }
        self.by_name
            .insert(name.to_string(), Registration { type_id, factory });
        self.by_type.insert(type_id, name.to_string());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Option<Registration> {
        let registration = self.by_name.shift_remove(name)?;
        self.by_type.remove(&registration.type_id);
        Some(registration)
    }

    pub(crate) fn factory(&self, name: &str) -> Result<Factory> {
        self.by_name
            .get(name)
            .map(|registration| Rc::clone(&registration.factory))
            .ok_or_else(|| {
                ServerError::UnknownType {
                    type_name: name.to_string(),
                }
                .into()
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }
}

impl Server {
    /// Register `T` under [`ObjectType::type_name`].
    pub fn register<T: ObjectType + Default>(&mut self) -> Result<()> {
        self.register_as::<T>(T::type_name())
    }

    /// Register `T` under an explicit name.
    ///
    /// Fails with `DuplicateTypeRegistration` if either the name or the Rust type is already
    /// registered.
    pub fn register_as<T: ObjectType + Default>(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ServerError::invalid("register", "type name must not be empty").into());
        }
        let factory: Factory = Rc::new(|| Rc::new(T::default()) as Rc<dyn ObjectType>);
        self.types.insert(name, TypeId::of::<T>(), factory)?;
        tracing::debug!(type_name = name, "registered object type");
        Ok(())
    }

    /// Remove a type by name.
    ///
    /// Fails with `TypeInUse` while any live object has this type.
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        if !self.types.by_name.contains_key(name) {
            return Err(ServerError::UnknownType {
                type_name: name.to_string(),
            }
            .into());
        }
        let count = self
            .objects
            .values()
            .filter(|object| object.type_name() == name)
            .count();
        if count > 0 {
            return Err(ServerError::TypeInUse {
                type_name: name.to_string(),
                count,
            }
            .into());
        }
        self.types.remove(name);
        tracing::debug!(type_name = name, "unregistered object type");
        Ok(())
    }

    /// Remove the registration of `T`, whatever name it was registered under.
    pub fn unregister_type<T: ObjectType>(&mut self) -> Result<()> {
        let name = self
            .get_object_type_name::<T>()
            .map(str::to_string)
            .ok_or_else(|| ServerError::UnknownType {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        self.unregister(&name)
    }

    /// Rust type registered under `name`.
    pub fn get_object_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .by_name
            .get(name)
            .map(|registration| registration.type_id)
    }

    /// Name `T` is registered under.
    pub fn get_object_type_name<T: ObjectType>(&self) -> Option<&str> {
        self.types
            .by_type
            .get(&TypeId::of::<T>())
            .map(String::as_str)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.types.by_name.contains_key(name)
    }

    /// Registered type names in registration order.
    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.types.by_name.keys().map(String::as_str)
    }
}
