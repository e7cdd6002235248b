//! Naming and DDL configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default identity attribute name.
pub const DEFAULT_IDENTITY_ATTRIBUTE: &str = "id";

/// Default maximum identifier length (MySQL's limit).
pub const DEFAULT_MAX_IDENTIFIER_LEN: usize = 64;

/// Shortest identifier limit that still fits one name character, `_` and
/// the 8-character digest suffix.
pub const MIN_IDENTIFIER_LEN: usize = 10;

/// Default table options appended to every `CREATE TABLE`.
pub const DEFAULT_TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8";

/// How key attributes are renamed when projected into a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyNaming {
    /// Only the identity attribute is qualified (`id` -> `user_id`); every
    /// other attribute keeps its name.
    #[default]
    Compatible,
    /// Every projected attribute is qualified with the parent's name
    /// (`code` -> `user_code`).
    Qualified,
}

/// A function applied to every root entity name before names are derived.
#[derive(Clone)]
pub struct NameTransformer(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl NameTransformer {
    /// Wrap a transformer function.
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply the transformer.
    pub fn apply(&self, name: &str) -> String {
        (self.0)(name)
    }
}

impl fmt::Debug for NameTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NameTransformer(..)")
    }
}

/// Configuration for deriving relation, column and constraint names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Pluralize root relation names (`user` -> `users`).
    pub pluralize: bool,

    /// Name of the generic surrogate identity attribute.
    pub identity_attribute: String,

    /// Foreign key attribute naming policy.
    pub foreign_key_naming: ForeignKeyNaming,

    /// Longest identifier allowed before it is shortened with a digest suffix.
    /// None disables shortening. Limits below [`MIN_IDENTIFIER_LEN`] are
    /// rejected by [`NamingConfig::validate`].
    pub max_identifier_len: Option<usize>,

    /// Optional transformer for root entity names.
    #[serde(skip)]
    pub transformer: Option<NameTransformer>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            pluralize: true,
            identity_attribute: DEFAULT_IDENTITY_ATTRIBUTE.to_string(),
            foreign_key_naming: ForeignKeyNaming::Compatible,
            max_identifier_len: Some(DEFAULT_MAX_IDENTIFIER_LEN),
            transformer: None,
        }
    }
}

impl NamingConfig {
    /// Set whether root names are pluralized.
    pub fn with_pluralize(mut self, pluralize: bool) -> Self {
        self.pluralize = pluralize;
        self
    }

    /// Set the identity attribute name.
    pub fn with_identity_attribute(mut self, name: impl Into<String>) -> Self {
        self.identity_attribute = name.into();
        self
    }

    /// Set the foreign key naming policy.
    pub fn with_foreign_key_naming(mut self, naming: ForeignKeyNaming) -> Self {
        self.foreign_key_naming = naming;
        self
    }

    /// Set the maximum identifier length.
    pub fn with_max_identifier_len(mut self, len: usize) -> Self {
        self.max_identifier_len = Some(len);
        self
    }

    /// Disable identifier shortening.
    pub fn without_identifier_limit(mut self) -> Self {
        self.max_identifier_len = None;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_identifier_len {
            if max < MIN_IDENTIFIER_LEN {
                return Err(Error::Config(format!(
                    "max_identifier_len must be at least {}, got {}",
                    MIN_IDENTIFIER_LEN, max
                )));
            }
        }
        if self.identity_attribute.trim().is_empty() {
            return Err(Error::Config("identity_attribute must not be empty".to_string()));
        }
        Ok(())
    }

    /// Set the root name transformer.
    pub fn with_transformer(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.transformer = Some(NameTransformer::new(f));
        self
    }
}

/// Referential action for foreign key constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// `NO ACTION`.
    #[default]
    NoAction,
    /// `RESTRICT`.
    Restrict,
    /// `CASCADE`.
    Cascade,
    /// `SET NULL`.
    SetNull,
}

impl ReferentialAction {
    /// SQL keyword form.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
        }
    }
}

/// Configuration for the DDL generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdlConfig {
    /// Options appended after each `CREATE TABLE (...)`. None omits them.
    pub table_options: Option<String>,

    /// Action on delete of a referenced row.
    pub on_delete: ReferentialAction,

    /// Action on update of a referenced key.
    pub on_update: ReferentialAction,
}

impl Default for DdlConfig {
    fn default() -> Self {
        Self {
            table_options: Some(DEFAULT_TABLE_OPTIONS.to_string()),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }
}

impl DdlConfig {
    /// Set the table options.
    pub fn with_table_options(mut self, options: impl Into<String>) -> Self {
        self.table_options = Some(options.into());
        self
    }

    /// Omit table options.
    pub fn without_table_options(mut self) -> Self {
        self.table_options = None;
        self
    }

    /// Set the delete action.
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Set the update action.
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }
}
