//! Foreign key edges and unresolved references.

use super::attribute::Attribute;
use super::entity::EntityType;
use super::heading::Heading;
use super::key::Key;
use super::naming::Namer;
use crate::error::{Error, Result};
use tracing::debug;

/// Identifies one heading by name together with its owning entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    /// Owning entity type.
    pub entity_type: EntityType,
    /// Heading name.
    pub relation: String,
    /// Whether the heading is the entity's base relation.
    pub base: bool,
}

impl RelationRef {
    /// Reference to a heading.
    pub fn of(heading: &Heading) -> Self {
        Self {
            entity_type: heading.entity_type().clone(),
            relation: heading.name().to_string(),
            base: heading.is_base(),
        }
    }
}

/// Resolved edge: the child's key attributes hold the values of the
/// parent's key attributes, pairwise in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    parent: RelationRef,
    parent_key: Key,
    child: RelationRef,
    child_key: Key,
}

impl ForeignKey {
    /// Wire `child` to the key `key_name` of `parent`.
    ///
    /// The projected key attributes are appended to `child`. Nothing is
    /// modified when the key is missing, a domain cannot be projected, or a
    /// projected name already exists in `child`.
    pub fn create(
        parent: &Heading,
        parent_namer: &Namer,
        key_name: &str,
        child: &mut Heading,
    ) -> Result<ForeignKey> {
        let parent_key = parent
            .get_key(key_name)
            .ok_or_else(|| Error::missing_key(parent.name(), key_name, "does not exist"))?
            .clone();
        let child_key = parent_key.for_foreign_key(parent_namer, parent.name())?;

        for (idx, attribute) in child_key.attributes().iter().enumerate() {
            let repeated = child_key.attributes()[..idx]
                .iter()
                .any(|a| a.name() == attribute.name());
            if repeated || child.contains(attribute.name()) {
                return Err(Error::DuplicateAttribute {
                    relation: child.name().to_string(),
                    attribute: attribute.name().to_string(),
                });
            }
        }

        for attribute in child_key.attributes() {
            child.push_attribute(attribute.clone())?;
        }

        let fk = ForeignKey {
            parent: RelationRef::of(parent),
            parent_key,
            child: RelationRef::of(child),
            child_key,
        };
        child.push_foreign_key(fk.clone());

        debug!(
            child = %fk.child.relation,
            parent = %fk.parent.relation,
            attributes = ?fk.child_key.attribute_names(),
            "Created foreign key"
        );
        Ok(fk)
    }

    /// Referenced relation.
    pub fn parent(&self) -> &RelationRef {
        &self.parent
    }

    /// Referenced key.
    pub fn parent_key(&self) -> &Key {
        &self.parent_key
    }

    /// Referencing relation.
    pub fn child(&self) -> &RelationRef {
        &self.child
    }

    /// Projected key held by the referencing relation.
    pub fn child_key(&self) -> &Key {
        &self.child_key
    }

    /// `(child attribute, parent attribute)` pairs in key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&Attribute, &Attribute)> {
        self.child_key
            .attributes()
            .iter()
            .zip(self.parent_key.attributes())
    }
}

/// A declared intent for one entity type to hold a foreign key into a key of
/// another entity type. Resolved into a [`ForeignKey`] at finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Heading that will hold the foreign key.
    pub source: String,
    /// Entity type declaring the reference.
    pub source_type: EntityType,
    /// Name of the referenced key.
    pub key_name: String,
    /// Referenced entity type.
    pub target: EntityType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarDomain;
    use crate::config::NamingConfig;
    use std::sync::Arc;

    fn user_heading() -> (Heading, Namer) {
        let user = EntityType::new("User");
        let namer = Namer::for_entity(&user, Arc::new(NamingConfig::default()));
        let mut heading = Heading::new(namer.heading_name(), user, Vec::new());
        let first = Attribute::new("first_name", ScalarDomain::String);
        let last = Attribute::new("last_name", ScalarDomain::String);
        heading.push_attribute(first.clone()).unwrap();
        heading.push_attribute(last.clone()).unwrap();
        heading.push_key(Key::primary(vec![first, last]));
        (heading, namer)
    }

    #[test]
    fn test_create_appends_projected_attributes() {
        let (users, namer) = user_heading();
        let mut things = Heading::new("things", EntityType::new("Thing"), Vec::new());
        things
            .push_attribute(Attribute::new("id", ScalarDomain::Serial))
            .unwrap();

        let fk = ForeignKey::create(&users, &namer, "primary", &mut things).unwrap();

        assert_eq!(things.attribute_names(), vec!["id", "first_name", "last_name"]);
        assert_eq!(fk.child_key().name(), "user_primary");
        assert_eq!(fk.parent().relation, "users");
        assert_eq!(fk.child().relation, "things");
        assert_eq!(things.foreign_keys().len(), 1);

        let pairs: Vec<_> = fk.pairs().map(|(c, p)| (c.name(), p.name())).collect();
        assert_eq!(pairs, vec![("first_name", "first_name"), ("last_name", "last_name")]);
    }

    #[test]
    fn test_missing_key_leaves_child_untouched() {
        let (users, namer) = user_heading();
        let mut things = Heading::new("things", EntityType::new("Thing"), Vec::new());

        let err = ForeignKey::create(&users, &namer, "other", &mut things).unwrap_err();

        assert!(matches!(err, Error::MissingKey { ref key, .. } if key == "other"));
        assert!(things.attributes().is_empty());
    }

    #[test]
    fn test_collision_is_rejected_atomically() {
        let (users, namer) = user_heading();
        let mut things = Heading::new("things", EntityType::new("Thing"), Vec::new());
        things
            .push_attribute(Attribute::new("last_name", ScalarDomain::String))
            .unwrap();

        let err = ForeignKey::create(&users, &namer, "primary", &mut things).unwrap_err();

        assert_eq!(
            err,
            Error::DuplicateAttribute {
                relation: "things".into(),
                attribute: "last_name".into(),
            }
        );
        assert_eq!(things.attribute_names(), vec!["last_name"]);
        assert!(things.foreign_keys().is_empty());
    }
}
