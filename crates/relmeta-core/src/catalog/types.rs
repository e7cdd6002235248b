//! Value domains: storage type descriptors with foreign key projection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a domain.
pub type DomainRef = Arc<dyn Domain>;

/// The storage type of an attribute, and how it appears when referenced.
///
/// Implement this for custom column types. A domain that returns `None` from
/// [`Domain::for_foreign_key`] cannot be part of a key that other relations
/// reference.
pub trait Domain: fmt::Debug + Send + Sync {
    /// Column type definition used in `CREATE TABLE`.
    fn type_def(&self) -> String;

    /// Domain of a foreign key column pointing at a column of this domain.
    fn for_foreign_key(&self) -> Option<DomainRef>;
}

/// Built-in scalar domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarDomain {
    /// Auto-incrementing surrogate identity.
    Serial,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Double precision float.
    Float,
    /// Boolean stored as a tiny integer.
    Boolean,
    /// Variable length string of up to 255 characters.
    String,
    /// Variable length string with an explicit length.
    Varchar(u32),
    /// Date and time.
    DateTime,
    /// Unbounded text. Not usable in foreign keys.
    Text,
    /// Binary large object. Not usable in foreign keys.
    Blob,
}

impl ScalarDomain {
    /// Check if this domain can be referenced by a foreign key.
    pub fn supports_foreign_key(&self) -> bool {
        !matches!(self, ScalarDomain::Text | ScalarDomain::Blob)
    }

    /// Domain of a foreign key column referencing this domain.
    pub fn foreign_key_domain(&self) -> Option<ScalarDomain> {
        match self {
            ScalarDomain::Serial => Some(ScalarDomain::Integer),
            ScalarDomain::Text | ScalarDomain::Blob => None,
            other => Some(other.clone()),
        }
    }
}

impl Domain for ScalarDomain {
    fn type_def(&self) -> String {
        match self {
            ScalarDomain::Serial => "int(11) NOT NULL AUTO_INCREMENT".to_string(),
            ScalarDomain::Integer => "int(11) NOT NULL".to_string(),
            ScalarDomain::BigInt => "bigint(20) NOT NULL".to_string(),
            ScalarDomain::Float => "double NOT NULL".to_string(),
            ScalarDomain::Boolean => "tinyint(1) NOT NULL".to_string(),
            ScalarDomain::String => "varchar(255) NOT NULL".to_string(),
            ScalarDomain::Varchar(len) => format!("varchar({}) NOT NULL", len),
            ScalarDomain::DateTime => "datetime NOT NULL".to_string(),
            ScalarDomain::Text => "text".to_string(),
            ScalarDomain::Blob => "blob".to_string(),
        }
    }

    fn for_foreign_key(&self) -> Option<DomainRef> {
        self.foreign_key_domain()
            .map(|domain| Arc::new(domain) as DomainRef)
    }
}
