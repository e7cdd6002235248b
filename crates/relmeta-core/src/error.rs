//! Core error types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog, DDL, query, and attribute errors.
///
/// Every variant describes a declaration or usage mistake. None of them are
/// transient, so callers should surface them rather than retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Attribute name is not part of the relation's heading.
    #[error("attribute {attribute:?} is not in {relation}")]
    InvalidAttribute {
        /// Relation (heading) name.
        relation: String,
        /// Offending attribute name.
        attribute: String,
    },

    /// No foreign key connects the relation to the entity type.
    #[error("{relation} has no reference to {entity}")]
    InvalidReference {
        /// Relation holding (or expected to hold) the foreign key.
        relation: String,
        /// Entity type that was expected to be referenced.
        entity: String,
    },

    /// A value was not an instance of the expected entity type or relation.
    #[error("expected a {expected} but got a {actual}")]
    TypeMismatch {
        /// Expected entity type or relation.
        expected: String,
        /// Supplied entity type or relation.
        actual: String,
    },

    /// A domain cannot be projected into a foreign key column.
    #[error(
        "cannot convert key {key} of {relation} to a foreign key: \
         attribute {attribute:?} has domain {domain} which does not support foreign keys"
    )]
    ForeignKeyTranslation {
        /// Relation owning the key.
        relation: String,
        /// Key being translated.
        key: String,
        /// Attribute whose domain failed.
        attribute: String,
        /// Type definition of the failing domain.
        domain: String,
    },

    /// Named key does not exist, or the supplied values don't fit it.
    #[error("key {key:?} on {relation}: {reason}")]
    MissingKey {
        /// Relation searched.
        relation: String,
        /// Key name.
        key: String,
        /// What went wrong.
        reason: String,
    },

    /// Two relations are not connected by any foreign key.
    #[error("no join path from {from} to {to}")]
    NoJoinPath {
        /// Source relation of the query.
        from: String,
        /// Requested join target.
        to: String,
    },

    /// Mutation attempted on a readonly attribute container.
    #[error("attributes of {relation} are readonly")]
    ReadonlyViolation {
        /// Relation the container is bound to.
        relation: String,
    },

    /// Schema or query operation attempted before the registry was finalized.
    #[error("schema registry has not been finalized")]
    NotFinalized,

    /// Declaration attempted after the registry was finalized.
    #[error("schema registry is finalized and can no longer be modified")]
    AlreadyFinalized,

    /// Entity type was never declared.
    #[error("entity type {entity} is not declared")]
    UnknownEntity {
        /// Entity type name.
        entity: String,
    },

    /// Child relation was never declared on the entity type.
    #[error("{entity} has no child relation {relation:?}")]
    UnknownRelation {
        /// Owning entity type.
        entity: String,
        /// Local child relation name.
        relation: String,
    },

    /// Attribute name appears twice in one heading.
    #[error("attribute {attribute:?} is declared more than once in {relation}")]
    DuplicateAttribute {
        /// Relation (heading) name.
        relation: String,
        /// Repeated attribute name.
        attribute: String,
    },

    /// Two headings derive the same physical relation name, or two foreign
    /// keys derive the same constraint name.
    #[error("relation {relation} is declared more than once")]
    DuplicateRelation {
        /// Colliding relation or constraint name.
        relation: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed schema description.
    #[error("invalid schema description: {0}")]
    Description(String),

    /// An external record sink rejected a record.
    #[error("record sink error: {0}")]
    Sink(String),
}

impl Error {
    pub(crate) fn invalid_attribute(relation: impl Into<String>, attribute: impl Into<String>) -> Self {
        Error::InvalidAttribute {
            relation: relation.into(),
            attribute: attribute.into(),
        }
    }

    pub(crate) fn missing_key(
        relation: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::MissingKey {
            relation: relation.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Description(e.to_string())
    }
}
