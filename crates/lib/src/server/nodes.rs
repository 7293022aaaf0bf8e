//! Per-node state: attributes and tags.

use super::{Server, ServerError};
use crate::{
    Attribute, AttributeType, ObjectId, Result,
    object::ObjectError,
    topic::{EventKey, Mutation, TopicKey, Value},
};

impl Server {
    /// Declare an attribute on `id`, backed by a new `a/{id}/{name}` topic.
    ///
    /// `init` defaults to the empty value of the type. Event attributes hold no value.
    pub fn add_attribute(
        &mut self,
        id: &ObjectId,
        name: &str,
        ty: AttributeType,
        init: Option<Value>,
        stateful: bool,
    ) -> Result<Attribute> {
        if name.is_empty() {
            return Err(ServerError::invalid("add_attribute", "attribute name must not be empty").into());
        }
        let object = self.get_object(id)?;
        if object.has_attribute(name) {
            return Err(ObjectError::DuplicateAttribute {
                object: id.to_string(),
                name: name.to_string(),
            }
            .into());
        }
        let attribute = Attribute::new(id.clone(), name.to_string(), ty, stateful);
        let init = if ty == AttributeType::Event { None } else { init };
        self.topics
            .add_topic(attribute.key(), ty.topic_kind(), init, stateful)?;
        self.object_mut(id)?.insert_attribute(attribute.clone())?;
        tracing::trace!(%id, attribute = name, %ty, stateful, "added attribute");
        Ok(attribute)
    }

    /// Drop an attribute, its topic, its observers and its event handlers.
    pub fn remove_attribute(&mut self, id: &ObjectId, name: &str) -> Result<Attribute> {
        let attribute = self.object_mut(id)?.take_attribute(name)?;
        let key = attribute.key();
        self.topics.remove_topic(&key)?;
        self.observers.remove(&key);
        self.events.remove(&EventKey::object(id, name));
        tracing::trace!(%id, attribute = name, "removed attribute");
        Ok(attribute)
    }

    pub fn get_attribute(&self, id: &ObjectId, name: &str) -> Result<Attribute> {
        self.get_object(id)?
            .attribute(name)
            .cloned()
            .ok_or_else(|| {
                ObjectError::AttributeNotFound {
                    object: id.to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }

    pub fn has_attribute(&self, id: &ObjectId, name: &str) -> Result<bool> {
        Ok(self.get_object(id)?.has_attribute(name))
    }

    /// Current value of attribute `name` of `id`.
    pub fn attribute_value(&self, id: &ObjectId, name: &str) -> Result<&Value> {
        let key = self.get_attribute(id, name)?.key();
        self.topics.get(&key)
    }

    /// Add a tag to `id`. Adding a tag the object already has is a no-op.
    pub fn add_tag(&mut self, id: &ObjectId, tag: &str) -> Result<()> {
        self.get_object(id)?;
        self.mutate(&TopicKey::Tags(id.clone()), Mutation::Append(Value::from(tag)))?;
        Ok(())
    }

    pub fn remove_tag(&mut self, id: &ObjectId, tag: &str) -> Result<()> {
        self.get_object(id)?;
        self.mutate(&TopicKey::Tags(id.clone()), Mutation::Remove(Value::from(tag)))?;
        Ok(())
    }

    pub fn has_tag(&self, id: &ObjectId, tag: &str) -> Result<bool> {
        Ok(self.tags(id)?.iter().any(|t| t == tag))
    }

    pub fn tags(&self, id: &ObjectId) -> Result<Vec<String>> {
        self.get_object(id)?;
        let tags = self.topics.get(&TopicKey::Tags(id.clone()))?;
        Ok(tags
            .as_list()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_text)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}
