//! Attribute definitions for headings.

use super::naming::Namer;
use super::types::{Domain, DomainRef};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// One field of a relation: a name further defined by its domain.
#[derive(Clone)]
pub struct Attribute {
    name: String,
    domain: DomainRef,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, domain: impl Domain + 'static) -> Self {
        Self::with_domain(name, Arc::new(domain))
    }

    /// Create an attribute from a shared domain handle.
    pub fn with_domain(name: impl Into<String>, domain: DomainRef) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute domain.
    pub fn domain(&self) -> &dyn Domain {
        self.domain.as_ref()
    }

    /// Column type definition.
    pub fn type_def(&self) -> String {
        self.domain.type_def()
    }

    /// Project this attribute into a foreign key attribute named by the
    /// parent level's namer.
    ///
    /// `relation` and `key` only feed the error context.
    pub fn for_foreign_key(&self, namer: &Namer, relation: &str, key: &str) -> Result<Attribute> {
        let domain = self
            .domain
            .for_foreign_key()
            .ok_or_else(|| Error::ForeignKeyTranslation {
                relation: relation.to_string(),
                key: key.to_string(),
                attribute: self.name.clone(),
                domain: self.domain.type_def(),
            })?;
        Ok(Attribute {
            name: namer.foreign_key_name(&self.name),
            domain,
        })
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type_def", &self.domain.type_def())
            .finish()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.domain.type_def() == other.domain.type_def()
    }
}

impl Eq for Attribute {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityType, ScalarDomain};
    use crate::config::NamingConfig;

    fn thing_namer() -> Namer {
        Namer::for_entity(&EntityType::new("Thing"), Arc::new(NamingConfig::default()))
    }

    #[test]
    fn test_identity_attribute_is_qualified() {
        let id = Attribute::new("id", ScalarDomain::Serial);
        let fk = id.for_foreign_key(&thing_namer(), "things", "primary").unwrap();

        assert_eq!(fk.name(), "thing_id");
        assert_eq!(fk.type_def(), "int(11) NOT NULL");
    }

    #[test]
    fn test_natural_attribute_keeps_name() {
        let code = Attribute::new("code", ScalarDomain::Varchar(8));
        let fk = code.for_foreign_key(&thing_namer(), "things", "primary").unwrap();

        assert_eq!(fk.name(), "code");
        assert_eq!(fk, Attribute::new("code", ScalarDomain::Varchar(8)));
    }

    #[test]
    fn test_translation_error_names_the_attribute() {
        let body = Attribute::new("body", ScalarDomain::Text);
        let err = body
            .for_foreign_key(&thing_namer(), "things", "primary")
            .unwrap_err();

        assert_eq!(
            err,
            Error::ForeignKeyTranslation {
                relation: "things".into(),
                key: "primary".into(),
                attribute: "body".into(),
                domain: "text".into(),
            }
        );
    }
}
