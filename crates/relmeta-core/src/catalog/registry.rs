//! Schema registry: every heading, foreign key and reference of a schema.
//!
//! The registry has two phases. During declaration, entity types are added
//! with [`SchemaRegistry::declare`]. [`SchemaRegistry::finalize`] then
//! resolves references and freezes the graph; DDL generation, query
//! planning and attribute containers need a finalized registry.

use super::declare::HeadingBuilder;
use super::entity::{EntitySchema, EntityType};
use super::foreign_key::{ForeignKey, Reference};
use super::heading::Heading;
use super::key::{Key, PRIMARY_KEY};
use super::naming::{foreign_key_constraint_name, Namer};
use crate::config::NamingConfig;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Graph frozen at finalize.
#[derive(Debug)]
struct Frozen {
    headings: Vec<Arc<Heading>>,
    foreign_keys: Vec<ForeignKey>,
    entities: BTreeMap<EntityType, Arc<EntitySchema>>,
}

/// Registry of headings and foreign keys for a family of entity types.
#[derive(Debug)]
pub struct SchemaRegistry {
    config: Arc<NamingConfig>,
    /// Entity types in declaration order.
    order: Vec<EntityType>,
    namers: BTreeMap<EntityType, Namer>,
    headings: Vec<Heading>,
    foreign_keys: Vec<ForeignKey>,
    references: Vec<Reference>,
    frozen: Option<Frozen>,
}

/// Output of committing one entity declaration.
#[derive(Default)]
struct Staged {
    headings: Vec<Heading>,
    foreign_keys: Vec<ForeignKey>,
    references: Vec<Reference>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new(config: NamingConfig) -> Self {
        Self {
            config: Arc::new(config),
            order: Vec::new(),
            namers: BTreeMap::new(),
            headings: Vec::new(),
            foreign_keys: Vec::new(),
            references: Vec::new(),
            frozen: None,
        }
    }

    /// Naming configuration.
    pub fn naming(&self) -> &NamingConfig {
        &self.config
    }

    /// Check if the registry has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.frozen.is_some()
    }

    /// Declared entity types in declaration order.
    pub fn entity_types(&self) -> &[EntityType] {
        &self.order
    }

    /// Declared references in declaration order.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Declare an entity type: its base heading, keys, references and
    /// nested child relations.
    ///
    /// The declaration is committed as a whole. On error the registry is
    /// left as it was.
    pub fn declare(
        &mut self,
        entity: impl Into<EntityType>,
        f: impl FnOnce(&mut HeadingBuilder),
    ) -> Result<&mut Self> {
        if self.is_finalized() {
            return Err(Error::AlreadyFinalized);
        }
        self.config.validate()?;
        let entity = entity.into();
        let namer = Namer::for_entity(&entity, Arc::clone(&self.config));
        if self.namers.contains_key(&entity) {
            return Err(Error::DuplicateRelation {
                relation: namer.heading_name(),
            });
        }

        let mut builder = HeadingBuilder::default();
        f(&mut builder);

        let mut staged = Staged::default();
        stage_heading(&entity, &namer, Vec::new(), None, builder, &mut staged)?;

        let mut names: HashSet<&str> = self.headings.iter().map(|h| h.name()).collect();
        for heading in &staged.headings {
            if !names.insert(heading.name()) {
                return Err(Error::DuplicateRelation {
                    relation: heading.name().to_string(),
                });
            }
        }

        debug!(
            entity = %entity,
            headings = staged.headings.len(),
            references = staged.references.len(),
            "Declared entity"
        );
        self.headings.extend(staged.headings);
        self.foreign_keys.extend(staged.foreign_keys);
        self.references.extend(staged.references);
        self.namers.insert(entity.clone(), namer);
        self.order.push(entity);
        Ok(self)
    }

    /// Resolve references into foreign keys and freeze the registry.
    ///
    /// Fails with [`Error::DuplicateRelation`] when two foreign keys derive
    /// the same constraint name. Finalizing twice is a no-op. On error the registry stays in the
    /// declaration phase, unchanged.
    pub fn finalize(&mut self) -> Result<&mut Self> {
        if self.is_finalized() {
            return Ok(self);
        }
        self.config.validate()?;

        let mut headings = self.headings.clone();
        let mut foreign_keys = self.foreign_keys.clone();
        for reference in &self.references {
            let namer = self
                .namers
                .get(&reference.target)
                .ok_or_else(|| Error::UnknownEntity {
                    entity: reference.target.to_string(),
                })?;
            let parent_idx = headings
                .iter()
                .position(|h| h.is_base() && h.entity_type() == &reference.target)
                .ok_or_else(|| Error::UnknownEntity {
                    entity: reference.target.to_string(),
                })?;
            let child_idx = headings
                .iter()
                .position(|h| h.name() == reference.source)
                .ok_or_else(|| Error::UnknownEntity {
                    entity: reference.source_type.to_string(),
                })?;

            let parent = headings[parent_idx].clone();
            let fk = ForeignKey::create(&parent, namer, &reference.key_name, &mut headings[child_idx])?;
            foreign_keys.push(fk);
        }

        // Constraint names share one namespace per database.
        let mut constraints = HashSet::new();
        for fk in &foreign_keys {
            let name = foreign_key_constraint_name(
                &self.config,
                &fk.child().relation,
                &fk.parent().relation,
            );
            if !constraints.insert(name.clone()) {
                return Err(Error::DuplicateRelation { relation: name });
            }
        }

        let headings: Vec<Arc<Heading>> = headings.into_iter().map(Arc::new).collect();
        let mut entities = BTreeMap::new();
        for entity in &self.order {
            let base = headings
                .iter()
                .find(|h| h.is_base() && h.entity_type() == entity)
                .ok_or_else(|| Error::UnknownEntity {
                    entity: entity.to_string(),
                })?;
            let namer = self
                .namers
                .get(entity)
                .cloned()
                .ok_or_else(|| Error::UnknownEntity {
                    entity: entity.to_string(),
                })?;
            let mut schema = EntitySchema::new(entity.clone(), namer, Arc::clone(base));
            for child in headings
                .iter()
                .filter(|h| !h.is_base() && h.entity_type() == entity)
            {
                schema.insert_child(Arc::clone(child));
            }
            entities.insert(entity.clone(), Arc::new(schema));
        }

        info!(
            entities = entities.len(),
            headings = headings.len(),
            foreign_keys = foreign_keys.len(),
            "Schema registry finalized"
        );
        self.frozen = Some(Frozen {
            headings,
            foreign_keys,
            entities,
        });
        Ok(self)
    }

    fn frozen(&self) -> Result<&Frozen> {
        self.frozen.as_ref().ok_or(Error::NotFinalized)
    }

    /// Every heading in registry order.
    pub fn headings(&self) -> Result<&[Arc<Heading>]> {
        Ok(&self.frozen()?.headings)
    }

    /// Every foreign key in registry order: structural foreign keys as
    /// declared, then resolved references.
    pub fn foreign_keys(&self) -> Result<&[ForeignKey]> {
        Ok(&self.frozen()?.foreign_keys)
    }

    /// Compiled schema of an entity type.
    pub fn entity(&self, entity: &EntityType) -> Result<&Arc<EntitySchema>> {
        self.frozen()?
            .entities
            .get(entity)
            .ok_or_else(|| Error::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    /// Heading by physical name.
    pub fn heading(&self, name: &str) -> Result<Option<&Arc<Heading>>> {
        Ok(self.frozen()?.headings.iter().find(|h| h.name() == name))
    }
}

/// Build one heading and its children into `staged`, parent before child.
fn stage_heading(
    entity: &EntityType,
    namer: &Namer,
    path: Vec<String>,
    parent: Option<(&Heading, &Namer)>,
    builder: HeadingBuilder,
    staged: &mut Staged,
) -> Result<()> {
    let mut heading = Heading::new(namer.heading_name(), entity.clone(), path.clone());
    let mut primary = Vec::new();

    if let Some((parent, parent_namer)) = parent {
        let fk = ForeignKey::create(parent, parent_namer, PRIMARY_KEY, &mut heading)?;
        primary.extend(fk.child_key().attributes().iter().cloned());
        staged.foreign_keys.push(fk);
    }
    for attribute in builder.attributes {
        heading.push_attribute(attribute)?;
    }
    for name in &builder.key_attributes {
        primary.push(heading.attribute(name)?.clone());
    }
    if !primary.is_empty() {
        heading.push_key(Key::primary(primary));
    }
    for target in builder.references {
        staged.references.push(Reference {
            source: heading.name().to_string(),
            source_type: entity.clone(),
            key_name: PRIMARY_KEY.to_string(),
            target,
        });
    }

    debug!(
        heading = %heading.name(),
        attributes = heading.attributes().len(),
        "Declared heading"
    );
    let this = heading.clone();
    staged.headings.push(heading);

    for (child_name, child_builder) in builder.children {
        let child_namer = namer.for_child(&child_name);
        let mut child_path = path.clone();
        child_path.push(child_name);
        stage_heading(
            entity,
            &child_namer,
            child_path,
            Some((&this, namer)),
            child_builder,
            staged,
        )?;
    }
    Ok(())
}
