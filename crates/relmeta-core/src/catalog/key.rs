//! Uniqueness keys.

use super::attribute::Attribute;
use super::naming::Namer;
use crate::error::Result;

/// Name of the identity key of a heading.
pub const PRIMARY_KEY: &str = "primary";

/// A named, ordered set of attributes whose combined values are unique.
///
/// Attribute order is significant: it drives constraint naming and the
/// pairing of key attributes with foreign key attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    name: String,
    attributes: Vec<Attribute>,
}

impl Key {
    /// Create a key.
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Create the primary key.
    pub fn primary(attributes: Vec<Attribute>) -> Self {
        Self::new(PRIMARY_KEY, attributes)
    }

    /// Key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this is the primary key.
    pub fn is_primary(&self) -> bool {
        self.name == PRIMARY_KEY
    }

    /// Attributes in key order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute names in key order.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name()).collect()
    }

    /// Number of attributes.
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    /// Translate this key into the key a referencing relation holds.
    ///
    /// The key is renamed `<parent>_<key>` and each attribute goes through
    /// [`Attribute::for_foreign_key`]. `relation` is the owning heading's name,
    /// used for error context.
    pub fn for_foreign_key(&self, namer: &Namer, relation: &str) -> Result<Key> {
        let attributes = self
            .attributes
            .iter()
            .map(|a| a.for_foreign_key(namer, relation, &self.name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Key {
            name: namer.foreign_key_key_name(&self.name),
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityType, ScalarDomain};
    use crate::config::NamingConfig;
    use crate::error::Error;
    use std::sync::Arc;

    fn user_namer() -> Namer {
        Namer::for_entity(&EntityType::new("User"), Arc::new(NamingConfig::default()))
    }

    #[test]
    fn test_composite_key_translation_preserves_order() {
        let key = Key::primary(vec![
            Attribute::new("first_name", ScalarDomain::String),
            Attribute::new("last_name", ScalarDomain::String),
        ]);
        let fk = key.for_foreign_key(&user_namer(), "users").unwrap();

        assert_eq!(fk.name(), "user_primary");
        assert!(!fk.is_primary());
        assert_eq!(fk.attribute_names(), vec!["first_name", "last_name"]);
        assert_eq!(fk.arity(), 2);
    }

    #[test]
    fn test_translation_fails_for_unprojectable_member() {
        let key = Key::primary(vec![
            Attribute::new("id", ScalarDomain::Serial),
            Attribute::new("notes", ScalarDomain::Blob),
        ]);
        let err = key.for_foreign_key(&user_namer(), "users").unwrap_err();

        assert!(matches!(err, Error::ForeignKeyTranslation { ref attribute, .. } if attribute == "notes"));
    }
}
