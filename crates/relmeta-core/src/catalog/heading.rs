//! Relation definitions.

use super::attribute::Attribute;
use super::entity::EntityType;
use super::foreign_key::ForeignKey;
use super::key::{Key, PRIMARY_KEY};
use crate::error::{Error, Result};

/// The declared shape of one physical relation.
///
/// A base heading is the root relation of an entity type. A child heading
/// is nested under it (or under another child) and always carries one
/// foreign key back to its structural parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Physical relation name.
    name: String,
    /// Owning entity type.
    entity_type: EntityType,
    /// Local child names from the base heading. Empty for the base.
    path: Vec<String>,
    /// Attributes in column order.
    attributes: Vec<Attribute>,
    /// Uniqueness keys in declaration order.
    keys: Vec<Key>,
    /// Foreign keys held by this heading.
    foreign_keys: Vec<ForeignKey>,
}

impl Heading {
    pub(crate) fn new(name: impl Into<String>, entity_type: EntityType, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            entity_type,
            path,
            attributes: Vec::new(),
            keys: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Physical relation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning entity type.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Local path from the base heading.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Check if this is the base relation of its entity type.
    pub fn is_base(&self) -> bool {
        self.path.is_empty()
    }

    /// Attributes in column order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute names in column order.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name()).collect()
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Get an attribute by name, failing with `InvalidAttribute`.
    pub fn attribute(&self, name: &str) -> Result<&Attribute> {
        self.get_attribute(name)
            .ok_or_else(|| Error::invalid_attribute(&self.name, name))
    }

    /// Check if an attribute is part of this heading.
    pub fn contains(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Get a key by name.
    pub fn get_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name() == name)
    }

    /// Get a key by name, failing with `MissingKey`.
    pub fn key(&self, name: &str) -> Result<&Key> {
        self.get_key(name)
            .ok_or_else(|| Error::missing_key(&self.name, name, "does not exist"))
    }

    /// The primary key, if declared.
    pub fn primary_key(&self) -> Option<&Key> {
        self.get_key(PRIMARY_KEY)
    }

    /// Foreign keys held by this heading, in creation order.
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Foreign key from this heading into the named relation.
    pub fn foreign_key_to(&self, relation: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.parent().relation == relation)
    }

    /// Foreign key from this heading into the base relation of `entity`.
    pub fn reference_to(&self, entity: &EntityType) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.parent().base && &fk.parent().entity_type == entity)
    }

    /// Foreign key back to the structural parent. None for base headings.
    pub fn structural_parent(&self) -> Option<&ForeignKey> {
        if self.is_base() {
            return None;
        }
        self.foreign_keys.first()
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) -> Result<()> {
        if self.contains(attribute.name()) {
            return Err(Error::DuplicateAttribute {
                relation: self.name.clone(),
                attribute: attribute.name().to_string(),
            });
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub(crate) fn push_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub(crate) fn push_foreign_key(&mut self, fk: ForeignKey) {
        self.foreign_keys.push(fk);
    }
}
