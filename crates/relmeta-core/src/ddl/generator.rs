//! Schema statement generation.
//!
//! Statements come in two groups: every `CREATE TABLE` first, in registry
//! order, then every `ALTER TABLE ... ADD CONSTRAINT` for foreign keys, in
//! registry order. Every referenced table therefore exists before a
//! constraint names it. Output depends only on the registry, so generating
//! twice gives identical text.

use super::quoting::Quoter;
use crate::catalog::{
    foreign_key_constraint_name, unique_key_name, EntityType, ForeignKey, Heading, Key,
    SchemaRegistry,
};
use crate::config::DdlConfig;
use crate::error::Result;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Generates DDL for a finalized registry.
pub struct DdlGenerator<'a> {
    registry: &'a SchemaRegistry,
    quoter: &'a dyn Quoter,
    config: DdlConfig,
}

impl<'a> DdlGenerator<'a> {
    /// Create a generator with the default configuration.
    pub fn new(registry: &'a SchemaRegistry, quoter: &'a dyn Quoter) -> Self {
        Self {
            registry,
            quoter,
            config: DdlConfig::default(),
        }
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: DdlConfig) -> Self {
        self.config = config;
        self
    }

    /// Statements for every heading and foreign key in the registry.
    pub fn creation_statements(&self) -> Result<Vec<String>> {
        let headings = self.registry.headings()?;
        let foreign_keys = self.registry.foreign_keys()?;
        Ok(self.emit(
            headings.iter().map(|h| &**h),
            foreign_keys.iter(),
        ))
    }

    /// Statements for `entities` and every entity type they reference,
    /// directly or transitively.
    pub fn creation_statements_for(&self, entities: &[EntityType]) -> Result<Vec<String>> {
        let headings = self.registry.headings()?;
        let foreign_keys = self.registry.foreign_keys()?;

        let mut included: BTreeSet<&EntityType> = BTreeSet::new();
        let mut pending: Vec<&EntityType> = Vec::new();
        for entity in entities {
            pending.push(self.registry.entity(entity)?.entity_type());
        }
        while let Some(entity) = pending.pop() {
            if !included.insert(entity) {
                continue;
            }
            for fk in foreign_keys.iter().filter(|fk| &fk.child().entity_type == entity) {
                pending.push(&fk.parent().entity_type);
            }
        }

        Ok(self.emit(
            headings
                .iter()
                .map(|h| &**h)
                .filter(|h| included.contains(h.entity_type())),
            foreign_keys
                .iter()
                .filter(|fk| included.contains(&fk.child().entity_type)),
        ))
    }

    fn emit<'h>(
        &self,
        headings: impl Iterator<Item = &'h Heading>,
        foreign_keys: impl Iterator<Item = &'h ForeignKey>,
    ) -> Vec<String> {
        let mut statements: Vec<String> = headings.map(|h| self.create_table_statement(h)).collect();
        let tables = statements.len();
        statements.extend(foreign_keys.map(|fk| self.alter_statement(fk)));

        for statement in &statements {
            debug!(statement = %statement, "Generated statement");
        }
        info!(
            tables,
            constraints = statements.len() - tables,
            "DDL generated"
        );
        statements
    }

    /// `CREATE TABLE` statement for one heading: one column per attribute,
    /// then one unique key per key.
    pub fn create_table_statement(&self, heading: &Heading) -> String {
        let mut inside: Vec<String> = heading
            .attributes()
            .iter()
            .map(|a| format!("{} {}", self.quoter.quote_column_name(a.name()), a.type_def()))
            .collect();
        inside.extend(heading.keys().iter().map(|k| self.unique_key_clause(heading, k)));

        let mut sql = vec![
            format!("CREATE TABLE {}", self.quoter.quote_table_name(heading.name())),
            "(".to_string(),
            inside.join(", "),
            ")".to_string(),
        ];
        if let Some(options) = &self.config.table_options {
            sql.push(options.clone());
        }
        sql.join(" ")
    }

    fn unique_key_clause(&self, heading: &Heading, key: &Key) -> String {
        let names = key.attribute_names();
        let name = unique_key_name(self.registry.naming(), heading.name(), &names);
        format!(
            "UNIQUE KEY {} ({})",
            self.quoter.quote_column_name(&name),
            self.column_list(&names)
        )
    }

    /// `ALTER TABLE` statement adding one foreign key constraint.
    pub fn alter_statement(&self, fk: &ForeignKey) -> String {
        let child = &fk.child().relation;
        let parent = &fk.parent().relation;
        let name = foreign_key_constraint_name(self.registry.naming(), child, parent);
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.quoter.quote_table_name(child),
            self.quoter.quote_column_name(&name),
            self.column_list(&fk.child_key().attribute_names()),
            self.quoter.quote_table_name(parent),
            self.column_list(&fk.parent_key().attribute_names()),
            self.config.on_delete.as_sql(),
            self.config.on_update.as_sql(),
        )
    }

    fn column_list(&self, names: &[&str]) -> String {
        names
            .iter()
            .map(|n| self.quoter.quote_column_name(n))
            .collect::<Vec<_>>()
            .join(",")
    }
}
