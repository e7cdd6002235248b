//! Subcommand implementations.
//!
//! Every command loads a schema description, compiles it into a finalized
//! registry and renders text for stdout.

use crate::dialect::Dialect;
use relmeta_core::catalog::SchemaDescription;
use relmeta_core::{DdlGenerator, EntityType, Heading, QueryBuilder, SchemaRegistry, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors reported by the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] relmeta_core::Error),

    #[error("invalid filter '{0}': expected attribute=value")]
    Filter(String),

    #[error("cannot encode plan: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cannot render output: {0}")]
    Render(#[from] std::fmt::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;

/// Read and parse a JSON schema description.
pub fn load(path: &Path) -> CliResult<SchemaDescription> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let description = SchemaDescription::from_json(&json)?;
    debug!(path = %path.display(), entities = description.entities.len(), "loaded schema description");
    Ok(description)
}

/// Creation statements, optionally restricted to some entity types and the
/// relations they depend on.
pub fn ddl(
    description: &SchemaDescription,
    dialect: Dialect,
    entities: &[String],
) -> CliResult<Vec<String>> {
    let registry = description.compile()?;
    let generator =
        DdlGenerator::new(&registry, dialect.quoter()).with_config(description.ddl.clone());
    let statements = if entities.is_empty() {
        generator.creation_statements()?
    } else {
        let entities: Vec<EntityType> = entities.iter().map(|e| EntityType::new(e.as_str())).collect();
        generator.creation_statements_for(&entities)?
    };
    Ok(statements)
}

/// Human-readable summary of every relation.
pub fn describe(description: &SchemaDescription) -> CliResult<String> {
    let registry = description.compile()?;
    let mut out = String::new();
    for heading in registry.headings()? {
        describe_heading(&mut out, heading)?;
    }
    Ok(out)
}

fn describe_heading(out: &mut impl Write, heading: &Heading) -> fmt::Result {
    let owner = if heading.is_base() {
        heading.entity_type().to_string()
    } else {
        format!("{}.{}", heading.entity_type(), heading.path().join("."))
    };
    writeln!(out, "{} ({})", heading.name(), owner)?;
    for attribute in heading.attributes() {
        writeln!(out, "  {} {}", attribute.name(), attribute.type_def())?;
    }
    for key in heading.keys() {
        writeln!(out, "  key {} ({})", key.name(), key.attribute_names().join(", "))?;
    }
    for fk in heading.foreign_keys() {
        let (local, remote): (Vec<&str>, Vec<&str>) =
            fk.pairs().map(|(c, p)| (c.name(), p.name())).unzip();
        writeln!(
            out,
            "  references {} ({}) -> ({})",
            fk.parent().relation,
            local.join(", "),
            remote.join(", ")
        )?;
    }
    Ok(())
}

/// Query options for [`plan`].
#[derive(Debug, Default)]
pub struct PlanRequest {
    pub entity: String,
    pub references: Vec<String>,
    pub children: Vec<String>,
    pub filters: Vec<String>,
}

/// Pretty JSON query plan over the requested joins and equality filters.
pub fn plan(description: &SchemaDescription, request: &PlanRequest) -> CliResult<String> {
    let registry = description.compile()?;
    build_plan(&registry, request)
}

fn build_plan(registry: &SchemaRegistry, request: &PlanRequest) -> CliResult<String> {
    let mut query = QueryBuilder::new(registry, &EntityType::from(request.entity.as_str()))?;
    for reference in &request.references {
        let join = query.reference(&EntityType::from(reference.as_str()))?;
        query.include(&join)?;
    }
    for child in &request.children {
        let join = query.child(child)?;
        query.include(&join)?;
    }
    let filters = request
        .filters
        .iter()
        .map(|f| parse_filter(f))
        .collect::<CliResult<BTreeMap<String, Value>>>()?;
    if !filters.is_empty() {
        query.find_all(filters)?;
    }
    Ok(serde_json::to_string_pretty(&query.build())?)
}

/// Parses `attribute=value`; integer-looking values become integers.
fn parse_filter(filter: &str) -> CliResult<(String, Value)> {
    let (name, raw) = filter
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| CliError::Filter(filter.to_string()))?;
    let value = match raw.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::from(raw),
    };
    Ok((name.trim().to_string(), value))
}
