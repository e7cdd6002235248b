//! Declaration builder for one heading and its nested children.

use super::attribute::Attribute;
use super::entity::EntityType;
use super::types::{Domain, DomainRef};

/// Collects the declarations for one heading.
///
/// Nothing is validated here. The registry checks names, keys and
/// references when the whole declaration is committed.
#[derive(Debug, Default)]
pub struct HeadingBuilder {
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) key_attributes: Vec<String>,
    pub(crate) references: Vec<EntityType>,
    pub(crate) children: Vec<(String, HeadingBuilder)>,
}

impl HeadingBuilder {
    /// Declare an attribute that is also part of the primary key.
    pub fn key(&mut self, name: impl Into<String>, domain: impl Domain + 'static) -> &mut Self {
        let attribute = Attribute::new(name, domain);
        self.key_attributes.push(attribute.name().to_string());
        self.attributes.push(attribute);
        self
    }

    /// Declare a key attribute with a shared domain.
    pub fn key_with(&mut self, name: impl Into<String>, domain: DomainRef) -> &mut Self {
        let attribute = Attribute::with_domain(name, domain);
        self.key_attributes.push(attribute.name().to_string());
        self.attributes.push(attribute);
        self
    }

    /// Declare a plain attribute.
    pub fn attribute(&mut self, name: impl Into<String>, domain: impl Domain + 'static) -> &mut Self {
        self.attributes.push(Attribute::new(name, domain));
        self
    }

    /// Declare a plain attribute with a shared domain.
    pub fn attribute_with(&mut self, name: impl Into<String>, domain: DomainRef) -> &mut Self {
        self.attributes.push(Attribute::with_domain(name, domain));
        self
    }

    /// Declare a foreign key into the primary key of `target`.
    pub fn reference(&mut self, target: impl Into<EntityType>) -> &mut Self {
        self.references.push(target.into());
        self
    }

    /// Declare a nested child relation.
    ///
    /// The child automatically references this heading's primary key.
    pub fn child(&mut self, name: impl Into<String>, f: impl FnOnce(&mut HeadingBuilder)) -> &mut Self {
        let mut child = HeadingBuilder::default();
        f(&mut child);
        self.children.push((name.into(), child));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarDomain;

    #[test]
    fn test_builder_collects_declarations() {
        let mut builder = HeadingBuilder::default();
        builder
            .key("id", ScalarDomain::Serial)
            .attribute("name", ScalarDomain::String)
            .reference("User")
            .child("parts", |c| {
                c.key("position", ScalarDomain::Integer);
            });

        assert_eq!(builder.attributes.len(), 2);
        assert_eq!(builder.key_attributes, vec!["id"]);
        assert_eq!(builder.references, vec![EntityType::new("User")]);
        assert_eq!(builder.children.len(), 1);
        assert_eq!(builder.children[0].1.key_attributes, vec!["position"]);
    }
}
