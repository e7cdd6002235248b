//! Entity types and their compiled schemas.

use super::heading::Heading;
use super::naming::Namer;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name of a declared entity type, optionally namespaced with `::`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// Create an entity type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Every heading declared for one entity type, frozen at finalize.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    entity_type: EntityType,
    namer: Namer,
    base: Arc<Heading>,
    /// Child headings keyed by their dotted local path (`parts`, `parts.tags`).
    children: BTreeMap<String, Arc<Heading>>,
}

impl EntitySchema {
    pub(crate) fn new(entity_type: EntityType, namer: Namer, base: Arc<Heading>) -> Self {
        Self {
            entity_type,
            namer,
            base,
            children: BTreeMap::new(),
        }
    }

    pub(crate) fn insert_child(&mut self, heading: Arc<Heading>) {
        self.children.insert(heading.path().join("."), heading);
    }

    /// Entity type.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Root namer.
    pub fn namer(&self) -> &Namer {
        &self.namer
    }

    /// Base heading.
    pub fn base(&self) -> &Arc<Heading> {
        &self.base
    }

    /// Child heading by dotted local path.
    pub fn child(&self, path: &str) -> Result<&Arc<Heading>> {
        self.children
            .get(path)
            .ok_or_else(|| Error::UnknownRelation {
                entity: self.entity_type.to_string(),
                relation: path.to_string(),
            })
    }

    /// Check if a child relation is declared.
    pub fn has_child(&self, path: &str) -> bool {
        self.children.contains_key(path)
    }

    /// Child headings in path order.
    pub fn children(&self) -> impl Iterator<Item = &Arc<Heading>> {
        self.children.values()
    }

    /// Direct children of the base heading.
    pub fn direct_children(&self) -> impl Iterator<Item = &Arc<Heading>> {
        self.children.values().filter(|h| h.path().len() == 1)
    }
}
