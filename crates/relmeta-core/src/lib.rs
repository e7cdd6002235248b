//! relmeta core: relation metadata, DDL generation and join-resolving queries.
//!
//! Entity types are declared into a [`SchemaRegistry`], which derives
//! relation, column and constraint names and wires foreign keys between
//! headings. Once finalized, the registry feeds the [`DdlGenerator`], the
//! [`QueryBuilder`], and the [`Attributes`] containers of entity instances.
//!
//! ```
//! use relmeta_core::{EntityType, NamingConfig, QueryBuilder, ScalarDomain, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new(NamingConfig::default());
//! registry
//!     .declare("User", |h| {
//!         h.key("first_name", ScalarDomain::String)
//!             .key("last_name", ScalarDomain::String);
//!     })?
//!     .declare("Thing", |h| {
//!         h.key("id", ScalarDomain::Serial).reference("User");
//!     })?
//!     .finalize()?;
//!
//! let mut query = QueryBuilder::new(&registry, &EntityType::new("Thing"))?;
//! let users = query.reference(&EntityType::new("User"))?;
//! query.filter(users.attr("last_name")?.eq("Smith"))?;
//! assert_eq!(query.plan().joins.len(), 1);
//! # Ok::<(), relmeta_core::Error>(())
//! ```

pub mod catalog;
pub mod config;
pub mod ddl;
pub mod entity;
pub mod error;
pub mod query;
pub mod value;

pub use catalog::{
    Attribute, Domain, DomainRef, EntitySchema, EntityType, ForeignKey, Heading, HeadingBuilder,
    Key, Namer, Reference, RegistryCell, ScalarDomain, SchemaDescription, SchemaRegistry,
};
pub use config::{DdlConfig, ForeignKeyNaming, NamingConfig, ReferentialAction};
pub use ddl::{DdlGenerator, Quoter};
pub use entity::{Associations, Attributes, Entity, RecordSink, WriteKind};
pub use error::{Error, Result};
pub use query::{
    ColumnRef, Condition, Join, JoinPath, KeyArgs, KeyConstraint, Predicate, QueryBuilder,
    QueryPlan,
};
pub use value::Value;
