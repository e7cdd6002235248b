//! Serializable schema description.
//!
//! A description is the data form of the declaration builder. It lets a
//! schema live in a JSON file:
//!
//! ```json
//! {
//!   "entities": [
//!     { "name": "User",
//!       "keys": [{ "name": "first_name", "domain": "string" },
//!                { "name": "last_name", "domain": "string" }] },
//!     { "name": "Thing",
//!       "keys": [{ "name": "id", "domain": "serial" }],
//!       "references": ["User"] }
//!   ]
//! }
//! ```

use super::declare::HeadingBuilder;
use super::registry::SchemaRegistry;
use super::types::ScalarDomain;
use crate::config::{DdlConfig, NamingConfig};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One attribute of a described relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescription {
    /// Attribute name.
    pub name: String,
    /// Built-in domain.
    pub domain: ScalarDomain,
}

/// A described relation: an entity's base relation or a nested child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescription {
    /// Entity type name for roots, local child name for children.
    pub name: String,
    /// Primary key attributes, in key order.
    #[serde(default)]
    pub keys: Vec<AttributeDescription>,
    /// Other attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDescription>,
    /// Referenced entity types.
    #[serde(default)]
    pub references: Vec<String>,
    /// Nested child relations.
    #[serde(default)]
    pub children: Vec<RelationDescription>,
}

impl RelationDescription {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Description("relation name must not be empty".to_string()));
        }
        self.children.iter().try_for_each(|c| c.validate())
    }

    fn apply(&self, builder: &mut HeadingBuilder) {
        for key in &self.keys {
            builder.key(key.name.clone(), key.domain.clone());
        }
        for attribute in &self.attributes {
            builder.attribute(attribute.name.clone(), attribute.domain.clone());
        }
        for target in &self.references {
            builder.reference(target.as_str());
        }
        for child in &self.children {
            builder.child(child.name.clone(), |c| child.apply(c));
        }
    }
}

/// A complete schema with its naming and DDL configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDescription {
    /// Naming configuration.
    pub naming: NamingConfig,
    /// DDL configuration.
    pub ddl: DdlConfig,
    /// Entity types in declaration order.
    pub entities: Vec<RelationDescription>,
}

impl SchemaDescription {
    /// Parse a description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Declare every entity into a new registry and finalize it.
    pub fn compile(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::new(self.naming.clone());
        for entity in &self.entities {
            entity.validate()?;
            registry.declare(entity.name.as_str(), |h| entity.apply(h))?;
        }
        registry.finalize()?;
        Ok(registry)
    }
}
