//! Entity instances.

use super::association::{Associations, RecordSink};
use super::attributes::Attributes;
use crate::catalog::{EntitySchema, EntityType, SchemaRegistry};
use crate::error::Result;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An instance of a declared entity type: base attributes plus pending
/// child records.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: Arc<EntitySchema>,
    attributes: Attributes,
    associations: Associations,
    persisted: bool,
}

impl Entity {
    /// Create a new, unpersisted instance.
    pub fn new<K, V>(
        registry: &SchemaRegistry,
        entity: &EntityType,
        defaults: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = Arc::clone(registry.entity(entity)?);
        let attributes = Attributes::with_defaults(Arc::clone(schema.base()), defaults)?;
        Ok(Self {
            associations: Associations::new(Arc::clone(&schema)),
            schema,
            attributes,
            persisted: false,
        })
    }

    /// Build an instance from a row returned by a query executor.
    ///
    /// The instance is persisted and readonly: a query result is a complete
    /// snapshot, not something to edit in place.
    pub fn materialize(
        registry: &SchemaRegistry,
        entity: &EntityType,
        row: BTreeMap<String, Value>,
    ) -> Result<Self> {
        let mut instance = Self::new(registry, entity, row)?;
        instance.attributes.clear_modified();
        instance.attributes.set_readonly(true);
        instance.persisted = true;
        Ok(instance)
    }

    /// Entity type.
    pub fn entity_type(&self) -> &EntityType {
        self.schema.entity_type()
    }

    /// Compiled schema of the entity type.
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Base attribute container.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Read an attribute.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.attributes.get(name)
    }

    /// Assign an attribute.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.attributes.set(name, value)
    }

    /// Attach another entity as a reference.
    pub fn set_reference(&mut self, instance: &Entity) -> Result<()> {
        self.attributes
            .set_reference(instance.entity_type(), &instance.attributes)
    }

    /// Child record proxies.
    pub fn associations(&mut self) -> &mut Associations {
        &mut self.associations
    }

    /// Hand pending child records to `sink`, stamped with this instance as
    /// their parent.
    pub fn flush_associations(&mut self, sink: &mut dyn RecordSink) -> Result<usize> {
        self.associations.flush(&self.attributes, sink)
    }

    /// Check if the instance came from, or has been written to, storage.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Record that the persistence layer stored this instance.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
        self.attributes.clear_modified();
    }

    /// Primary key values of a persisted instance.
    pub fn key_values(&self) -> Option<Vec<Value>> {
        if !self.persisted {
            return None;
        }
        let key = self.schema.base().primary_key()?;
        key.attributes()
            .iter()
            .map(|a| self.attributes.get(a.name()).ok().cloned())
            .collect()
    }

    /// Primary key values joined with `,`, for use in URLs.
    pub fn to_param(&self) -> Option<String> {
        let values = self.key_values()?;
        let parts: Vec<String> = values
            .iter()
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .collect();
        Some(parts.join(","))
    }
}

impl AsRef<Attributes> for Entity {
    fn as_ref(&self) -> &Attributes {
        &self.attributes
    }
}
