//! Attribute container bound to one heading.

use crate::catalog::{EntityType, Heading};
use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const NULL: &Value = &Value::Null;

/// Runtime values of one relation instance.
///
/// Every name must be an attribute of the bound heading. Assignments are
/// that change a value are tracked as modified, and every assignment is
/// rejected while the container is readonly.
/// Failed operations leave the container unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    heading: Arc<Heading>,
    values: BTreeMap<String, Value>,
    modified: BTreeSet<String>,
    readonly: bool,
}

impl Attributes {
    /// Create an empty container.
    pub fn new(heading: Arc<Heading>) -> Self {
        Self {
            heading,
            values: BTreeMap::new(),
            modified: BTreeSet::new(),
            readonly: false,
        }
    }

    /// Create a container populated with `defaults`.
    pub fn with_defaults<K, V>(
        heading: Arc<Heading>,
        defaults: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut attributes = Self::new(heading);
        attributes.merge(defaults)?;
        Ok(attributes)
    }

    /// Bound heading.
    pub fn heading(&self) -> &Arc<Heading> {
        &self.heading
    }

    /// Check if `name` is an attribute of the bound heading.
    pub fn contains(&self, name: &str) -> bool {
        self.heading.contains(name)
    }

    /// Current value of an attribute. Unset attributes read as null.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.heading.attribute(name)?;
        Ok(self.values.get(name).unwrap_or(NULL))
    }

    /// Assign an attribute.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.check_writable()?;
        self.heading.attribute(name)?;
        self.assign(name.to_string(), value.into());
        Ok(())
    }

    /// Assign several attributes at once. Nothing is assigned unless every
    /// name is valid.
    pub fn merge<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.check_writable()?;
        let pairs: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for (name, _) in &pairs {
            self.heading.attribute(name)?;
        }
        for (name, value) in pairs {
            self.assign(name, value);
        }
        Ok(())
    }

    /// Attach `instance` as the referenced `entity`: every foreign key
    /// attribute of the reference is set from the matching key attribute of
    /// the instance.
    pub fn set_reference(&mut self, entity: &EntityType, instance: &Attributes) -> Result<()> {
        self.check_writable()?;
        let fk = self
            .heading
            .reference_to(entity)
            .ok_or_else(|| Error::InvalidReference {
                relation: self.heading.name().to_string(),
                entity: entity.to_string(),
            })?;

        let actual = instance.heading();
        if !actual.is_base() || actual.entity_type() != entity {
            return Err(Error::TypeMismatch {
                expected: entity.to_string(),
                actual: if actual.is_base() {
                    actual.entity_type().to_string()
                } else {
                    actual.name().to_string()
                },
            });
        }

        let assignments = fk
            .pairs()
            .map(|(child, parent)| -> Result<(String, Value)> {
                Ok((child.name().to_string(), instance.get(parent.name())?.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        for (name, value) in assignments {
            self.assign(name, value);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(Error::ReadonlyViolation {
                relation: self.heading.name().to_string(),
            });
        }
        Ok(())
    }

    fn assign(&mut self, name: String, value: Value) {
        if self.values.get(&name) != Some(&value) {
            self.modified.insert(name.clone());
        }
        self.values.insert(name, value);
    }

    /// Check if no attribute has been assigned.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot of the assigned values.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }

    /// Snapshot of the assigned values, leaving out `names`.
    pub fn to_map_excluding(&self, names: &[&str]) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Names whose value changed since the last [`Attributes::clear_modified`].
    pub fn modified(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Check if an attribute's value changed since the last clear.
    pub fn is_modified(&self, name: &str) -> bool {
        self.modified.contains(name)
    }

    /// Forget modification tracking.
    pub fn clear_modified(&mut self) {
        self.modified.clear();
    }

    /// Check if the container rejects assignments.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Mark the container readonly or writable.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }
}

impl AsRef<Attributes> for Attributes {
    fn as_ref(&self) -> &Attributes {
        self
    }
}
