//! Schema metadata for relmeta.
//!
//! The catalog holds the declared headings, keys, foreign keys and references
//! of a schema, and the naming policy that derives their physical names.

mod attribute;
mod cell;
mod declare;
mod description;
mod entity;
mod foreign_key;
mod heading;
mod key;
mod naming;
mod registry;
mod types;

pub use attribute::Attribute;
pub use cell::RegistryCell;
pub use declare::HeadingBuilder;
pub use description::{AttributeDescription, RelationDescription, SchemaDescription};
pub use entity::{EntitySchema, EntityType};
pub use foreign_key::{ForeignKey, Reference, RelationRef};
pub use heading::Heading;
pub use key::{Key, PRIMARY_KEY};
pub use naming::{foreign_key_constraint_name, pluralize, shorten, unique_key_name, Namer};
pub use registry::SchemaRegistry;
pub use types::{Domain, DomainRef, ScalarDomain};
