//! Predicates and query conditions.

use super::join::Join;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A column of a relation in a query.
///
/// `relation` is the alias the column is read through: the source relation's
/// name for the plan's own columns, the join identifier for joined columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Relation alias.
    pub relation: String,
    /// Attribute name.
    pub attribute: String,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(relation: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            attribute: attribute.into(),
        }
    }

    fn compare(&self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            column: self.clone(),
            op,
            value: value.into(),
        }
    }

    /// `column = value`.
    pub fn eq(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    /// `column <> value`.
    pub fn ne(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    /// `column < value`.
    pub fn lt(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    /// `column <= value`.
    pub fn le(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Le, value)
    }

    /// `column > value`.
    pub fn gt(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    /// `column >= value`.
    pub fn ge(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ge, value)
    }

    /// `column LIKE pattern`.
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        self.compare(CompareOp::Like, Value::String(pattern.into()))
    }

    /// `column IN (values)`.
    pub fn in_values(&self, values: Vec<Value>) -> Predicate {
        Predicate::In {
            column: self.clone(),
            values,
        }
    }

    /// `column IS NULL`.
    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull {
            column: self.clone(),
        }
    }

    /// `column IS NOT NULL`.
    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNotNull {
            column: self.clone(),
        }
    }

    /// `column = other`.
    pub fn eq_column(&self, other: &ColumnRef) -> Predicate {
        Predicate::Columns {
            left: self.clone(),
            op: CompareOp::Eq,
            right: other.clone(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.attribute)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// SQL LIKE pattern match.
    Like,
}

impl CompareOp {
    /// SQL operator text.
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// One atomic predicate of a query plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Column compared with a value.
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    /// Column is one of a set of values.
    In { column: ColumnRef, values: Vec<Value> },
    /// Column is null.
    IsNull { column: ColumnRef },
    /// Column is not null.
    IsNotNull { column: ColumnRef },
    /// Column compared with another column.
    Columns {
        left: ColumnRef,
        op: CompareOp,
        right: ColumnRef,
    },
}

impl Predicate {
    /// Columns this predicate reads.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::IsNull { column }
            | Predicate::IsNotNull { column } => vec![column],
            Predicate::Columns { left, right, .. } => vec![left, right],
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { column, op, value } => {
                write!(f, "{} {} {}", column, op.as_sql(), value)
            }
            Predicate::In { column, values } => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN ({})", column, values.join(", "))
            }
            Predicate::IsNull { column } => write!(f, "{} IS NULL", column),
            Predicate::IsNotNull { column } => write!(f, "{} IS NOT NULL", column),
            Predicate::Columns { left, op, right } => {
                write!(f, "{} {} {}", left, op.as_sql(), right)
            }
        }
    }
}

/// Values for a key lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyArgs {
    /// Values by attribute name. Must name exactly the key's attributes.
    Named(BTreeMap<String, Value>),
    /// Values in key order. Must match the key's arity.
    Positional(Vec<Value>),
}

impl KeyArgs {
    /// Named arguments from pairs.
    pub fn named<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        KeyArgs::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Positional arguments.
    pub fn positional<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        KeyArgs::Positional(values.into_iter().map(Into::into).collect())
    }
}

/// Constrain a query to the row identified by a named key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyConstraint {
    /// Key name.
    pub key: String,
    /// Key values.
    pub args: KeyArgs,
}

impl KeyConstraint {
    /// Create a key constraint.
    pub fn new(key: impl Into<String>, args: KeyArgs) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }
}

/// Anything a query can be filtered by.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A raw predicate on the plan.
    Predicate(Predicate),
    /// A join, together with the predicates recorded on it.
    Join(Join),
    /// A key lookup, expanded into one equality per key attribute.
    Key(KeyConstraint),
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Condition::Predicate(predicate)
    }
}

impl From<Join> for Condition {
    fn from(join: Join) -> Self {
        Condition::Join(join)
    }
}

impl From<KeyConstraint> for Condition {
    fn from(key: KeyConstraint) -> Self {
        Condition::Key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_display() {
        let age = ColumnRef::new("users", "age");
        assert_eq!(age.gt(30).to_string(), "users.age > 30");
        assert_eq!(
            ColumnRef::new("users", "last_name").eq("Smith").to_string(),
            "users.last_name = \"Smith\""
        );
        assert_eq!(
            age.in_values(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "users.age IN (1, 2)"
        );
        assert_eq!(age.is_null().to_string(), "users.age IS NULL");
        assert_eq!(
            ColumnRef::new("things", "first_name")
                .eq_column(&ColumnRef::new("j1", "first_name"))
                .to_string(),
            "things.first_name = j1.first_name"
        );
    }

    #[test]
    fn test_predicate_json_is_tagged() {
        let json = serde_json::to_value(ColumnRef::new("users", "age").le(40)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "compare",
                "column": { "relation": "users", "attribute": "age" },
                "op": "le",
                "value": 40
            })
        );
    }

    #[test]
    fn test_key_args_from_json() {
        let named: KeyArgs = serde_json::from_str(r#"{"first_name": "John"}"#).unwrap();
        assert_eq!(named, KeyArgs::named([("first_name", "John")]));

        let positional: KeyArgs = serde_json::from_str(r#"["John", "Smith"]"#).unwrap();
        assert_eq!(positional, KeyArgs::positional(["John", "Smith"]));
    }

    #[test]
    fn test_predicate_columns() {
        let p = ColumnRef::new("a", "x").eq_column(&ColumnRef::new("b", "y"));
        assert_eq!(p.columns().len(), 2);
        assert_eq!(ColumnRef::new("a", "x").is_not_null().columns().len(), 1);
    }
}
