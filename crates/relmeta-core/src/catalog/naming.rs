//! Deterministic name derivation for relations, columns and constraints.
//!
//! A [`Namer`] is created for each root entity type and derived once per
//! nesting level with [`Namer::for_child`]. The same nesting path always
//! yields the same names, regardless of declaration order.

use super::entity::EntityType;
use crate::config::{ForeignKeyNaming, NamingConfig, MIN_IDENTIFIER_LEN};
use convert_case::{Case, Casing};
use std::sync::Arc;

/// Length of the digest suffix appended to shortened identifiers.
const DIGEST_LEN: usize = 8;

/// Words whose plural is not formed by a suffix rule.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
];

/// Words with no distinct plural.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "money",
    "series",
    "species",
    "sheep",
    "fish",
    "data",
];

/// Name derivation for one nesting level.
#[derive(Debug, Clone)]
pub struct Namer {
    name: String,
    pluralize: bool,
    config: Arc<NamingConfig>,
}

impl Namer {
    /// Create the root namer for an entity type.
    ///
    /// `Shop::LineItem` becomes `shop_line_item`; the configured transformer
    /// is then applied.
    pub fn for_entity(entity: &EntityType, config: Arc<NamingConfig>) -> Self {
        let underscored = entity
            .as_str()
            .split("::")
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_case(Case::Snake))
            .collect::<Vec<_>>()
            .join("_");
        let name = match &config.transformer {
            Some(transformer) => transformer.apply(&underscored),
            None => underscored,
        };
        Self {
            pluralize: config.pluralize,
            name,
            config,
        }
    }

    /// Derive the namer for a nested child relation. Never pluralized.
    pub fn for_child(&self, child: &str) -> Self {
        Self {
            name: format!("{}_{}", self.name, child),
            pluralize: false,
            config: Arc::clone(&self.config),
        }
    }

    /// The unpluralized name of this level.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Naming configuration in effect.
    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    /// Physical relation name.
    pub fn heading_name(&self) -> String {
        let name = if self.pluralize {
            pluralize(&self.name)
        } else {
            self.name.clone()
        };
        shorten(&name, self.config.max_identifier_len)
    }

    /// Name of the key created when this level's key is projected into a
    /// foreign key.
    pub fn foreign_key_key_name(&self, key_name: &str) -> String {
        format!("{}_{}", self.name, key_name)
    }

    /// Name of a foreign key attribute projected from one of this level's
    /// key attributes.
    pub fn foreign_key_name(&self, attribute_name: &str) -> String {
        let qualify = match self.config.foreign_key_naming {
            ForeignKeyNaming::Compatible => attribute_name == self.config.identity_attribute,
            ForeignKeyNaming::Qualified => true,
        };
        if qualify {
            shorten(
                &format!("{}_{}", self.name, attribute_name),
                self.config.max_identifier_len,
            )
        } else {
            attribute_name.to_string()
        }
    }
}

/// Unique key constraint name for a relation and its key attributes.
pub fn unique_key_name(config: &NamingConfig, relation: &str, attributes: &[&str]) -> String {
    let mut parts = Vec::with_capacity(attributes.len() + 1);
    parts.push(relation);
    parts.extend_from_slice(attributes);
    shorten(&parts.join("_"), config.max_identifier_len)
}

/// Foreign key constraint name for a child relation referencing a parent.
pub fn foreign_key_constraint_name(config: &NamingConfig, child: &str, parent: &str) -> String {
    shorten(
        &format!("{}_{}_fk", child, parent),
        config.max_identifier_len,
    )
}

/// Shorten an identifier that exceeds `max_len`, keeping it unique by
/// appending a digest of the full name.
///
/// Limits below [`MIN_IDENTIFIER_LEN`] are raised to it.
pub fn shorten(name: &str, max_len: Option<usize>) -> String {
    let max_len = match max_len {
        Some(max) if name.len() > max.max(MIN_IDENTIFIER_LEN) => max.max(MIN_IDENTIFIER_LEN),
        _ => return name.to_string(),
    };
    let digest = hex::encode(blake3::hash(name.as_bytes()).as_bytes());
    let keep = max_len - DIGEST_LEN - 1;
    let prefix: String = name.chars().take(keep).collect();
    format!("{}_{}", prefix, &digest[..DIGEST_LEN])
}

/// English plural of the last `_`-separated word of `name`.
pub fn pluralize(name: &str) -> String {
    let (head, word) = match name.rfind('_') {
        Some(idx) => name.split_at(idx + 1),
        None => ("", name),
    };
    format!("{}{}", head, pluralize_word(word))
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(single, _)| *single == word) {
        return plural.to_string();
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before_y = stem.chars().last();
        if matches!(before_y, Some(c) if !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namer(entity: &str) -> Namer {
        Namer::for_entity(&EntityType::new(entity), Arc::new(NamingConfig::default()))
    }

    #[test]
    fn test_root_names() {
        assert_eq!(namer("User").heading_name(), "users");
        assert_eq!(namer("UsersAndThings::User").name(), "users_and_things_user");
        assert_eq!(
            namer("UsersAndThings::User").heading_name(),
            "users_and_things_users"
        );
        assert_eq!(namer("LineItem").heading_name(), "line_items");
    }

    #[test]
    fn test_child_names_are_not_pluralized() {
        let thing = namer("Thing");
        let parts = thing.for_child("parts");
        assert_eq!(parts.heading_name(), "thing_parts");
        assert_eq!(parts.for_child("tag").heading_name(), "thing_parts_tag");
    }

    #[test]
    fn test_pluralize_rules() {
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("shop_person"), "shop_people");
        assert_eq!(pluralize("equipment"), "equipment");
        assert_eq!(pluralize("status"), "statuses");
    }

    #[test]
    fn test_foreign_key_names_compatible() {
        let thing = namer("Thing");
        assert_eq!(thing.foreign_key_name("id"), "thing_id");
        assert_eq!(thing.foreign_key_name("code"), "code");
        assert_eq!(thing.foreign_key_key_name("primary"), "thing_primary");
    }

    #[test]
    fn test_foreign_key_names_qualified() {
        let config = NamingConfig::default().with_foreign_key_naming(ForeignKeyNaming::Qualified);
        let user = Namer::for_entity(&EntityType::new("User"), Arc::new(config));
        assert_eq!(user.foreign_key_name("first_name"), "user_first_name");
        assert_eq!(user.foreign_key_name("id"), "user_id");
    }

    #[test]
    fn test_transformer_applies_to_root() {
        let config = NamingConfig::default().with_transformer(|n| format!("app_{}", n));
        let user = Namer::for_entity(&EntityType::new("User"), Arc::new(config));
        assert_eq!(user.heading_name(), "app_users");
        assert_eq!(user.for_child("tags").heading_name(), "app_user_tags");
    }

    #[test]
    fn test_constraint_names() {
        let config = NamingConfig::default();
        assert_eq!(
            unique_key_name(&config, "users", &["first_name", "last_name"]),
            "users_first_name_last_name"
        );
        assert_eq!(
            foreign_key_constraint_name(&config, "things", "users"),
            "things_users_fk"
        );
    }

    #[test]
    fn test_shorten_is_deterministic_and_distinct() {
        let a = "a".repeat(80);
        let b = format!("{}b", "a".repeat(79));
        let short_a = shorten(&a, Some(64));
        let short_b = shorten(&b, Some(64));

        assert_eq!(short_a.len(), 64);
        assert_eq!(short_a, shorten(&a, Some(64)));
        assert_ne!(short_a, short_b);
        assert_eq!(shorten("users", Some(64)), "users");
        assert_eq!(shorten(&a, None), a);
    }

    #[test]
    fn test_shorten_raises_tiny_limits() {
        let name = "order_line_notes";
        let short = shorten(name, Some(4));
        assert_eq!(short.len(), MIN_IDENTIFIER_LEN);
        assert!(short.starts_with("o_"));
        assert_eq!(short, shorten(name, Some(MIN_IDENTIFIER_LEN)));
    }
}
