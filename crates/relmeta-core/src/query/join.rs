//! Join resolution between related headings.
//!
//! A join's direction is read from the foreign keys of the two headings:
//! - ToChild: the target holds a foreign key into the source, so the
//!   source's key attributes are paired with the target's foreign key
//!   attributes.
//! - ToParent: the source holds a foreign key into the target, so the
//!   source's foreign key attributes are paired with the target's key.
//!
//! Composite keys always expand to one equality per key attribute.

use super::predicate::{ColumnRef, Predicate};
use crate::catalog::{ForeignKey, Heading};
use crate::entity::Attributes;
use crate::error::{Error, Result};
use crate::value::Value;
use std::sync::Arc;

/// Direction of a join and the foreign key it follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPath {
    /// The target references the source.
    ToChild(ForeignKey),
    /// The source references the target.
    ToParent(ForeignKey),
}

impl JoinPath {
    /// Resolve the path from `source` to `target`.
    pub fn resolve(source: &Heading, target: &Heading) -> Result<JoinPath> {
        if let Some(fk) = target.foreign_key_to(source.name()) {
            return Ok(JoinPath::ToChild(fk.clone()));
        }
        if let Some(fk) = source.foreign_key_to(target.name()) {
            return Ok(JoinPath::ToParent(fk.clone()));
        }
        Err(Error::NoJoinPath {
            from: source.name().to_string(),
            to: target.name().to_string(),
        })
    }

    /// Foreign key followed by this path.
    pub fn foreign_key(&self) -> &ForeignKey {
        match self {
            JoinPath::ToChild(fk) | JoinPath::ToParent(fk) => fk,
        }
    }

    /// `(source attribute, target attribute)` pairs in key order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        match self {
            JoinPath::ToChild(fk) => fk
                .pairs()
                .map(|(child, parent)| (parent.name(), child.name()))
                .collect(),
            JoinPath::ToParent(fk) => fk
                .pairs()
                .map(|(child, parent)| (child.name(), parent.name()))
                .collect(),
        }
    }
}

/// A join from a query's source relation to a related heading.
///
/// Predicates recorded on the join are added to the plan when the join is
/// passed to [`QueryBuilder::filter`](super::QueryBuilder::filter).
#[derive(Debug, Clone)]
pub struct Join {
    id: String,
    source: Arc<Heading>,
    target: Arc<Heading>,
    path: JoinPath,
    predicates: Vec<Predicate>,
}

impl Join {
    pub(crate) fn new(id: String, source: Arc<Heading>, target: Arc<Heading>) -> Result<Self> {
        let path = JoinPath::resolve(&source, &target)?;
        Ok(Self {
            id,
            source,
            target,
            path,
            predicates: Vec::new(),
        })
    }

    /// Stable join identifier, also the alias of the joined relation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source heading of the query.
    pub fn source(&self) -> &Arc<Heading> {
        &self.source
    }

    /// Joined heading.
    pub fn target(&self) -> &Arc<Heading> {
        &self.target
    }

    /// Join direction.
    pub fn path(&self) -> &JoinPath {
        &self.path
    }

    /// Predicates recorded on this join.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Join condition: one column equality per key attribute.
    pub fn on(&self) -> Vec<Predicate> {
        self.path
            .pairs()
            .into_iter()
            .map(|(source, target)| {
                ColumnRef::new(self.source.name(), source)
                    .eq_column(&ColumnRef::new(&self.id, target))
            })
            .collect()
    }

    /// A column of the joined heading.
    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        self.target.attribute(name)?;
        Ok(ColumnRef::new(&self.id, name))
    }

    /// Start a predicate on an attribute of the joined heading.
    pub fn attr(self, name: &str) -> Result<JoinCondition> {
        let column = self.column(name)?;
        Ok(JoinCondition { join: self, column })
    }

    /// Constrain the query to rows related to `instance`, an instance of
    /// the joined heading.
    ///
    /// Produces one equality on the source relation per key attribute, with
    /// values read from the instance. Unset values compare as null.
    pub fn eq_instance(mut self, instance: impl AsRef<Attributes>) -> Result<Join> {
        let instance = instance.as_ref();
        if instance.heading().name() != self.target.name() {
            return Err(Error::TypeMismatch {
                expected: describe(&self.target),
                actual: describe(instance.heading()),
            });
        }
        let mut predicates = Vec::new();
        for (source, target) in self.path.pairs() {
            let value = instance.get(target)?.clone();
            predicates.push(ColumnRef::new(self.source.name(), source).eq(value));
        }
        self.predicates.extend(predicates);
        Ok(self)
    }
}

fn describe(heading: &Heading) -> String {
    if heading.is_base() {
        heading.entity_type().to_string()
    } else {
        heading.name().to_string()
    }
}

/// A pending predicate on one column of a join.
#[derive(Debug, Clone)]
pub struct JoinCondition {
    join: Join,
    column: ColumnRef,
}

impl JoinCondition {
    fn push(mut self, predicate: Predicate) -> Join {
        self.join.predicates.push(predicate);
        self.join
    }

    /// `column = value`.
    pub fn eq(self, value: impl Into<Value>) -> Join {
        let p = self.column.eq(value);
        self.push(p)
    }

    /// `column <> value`.
    pub fn ne(self, value: impl Into<Value>) -> Join {
        let p = self.column.ne(value);
        self.push(p)
    }

    /// `column < value`.
    pub fn lt(self, value: impl Into<Value>) -> Join {
        let p = self.column.lt(value);
        self.push(p)
    }

    /// `column <= value`.
    pub fn le(self, value: impl Into<Value>) -> Join {
        let p = self.column.le(value);
        self.push(p)
    }

    /// `column > value`.
    pub fn gt(self, value: impl Into<Value>) -> Join {
        let p = self.column.gt(value);
        self.push(p)
    }

    /// `column >= value`.
    pub fn ge(self, value: impl Into<Value>) -> Join {
        let p = self.column.ge(value);
        self.push(p)
    }

    /// `column LIKE pattern`.
    pub fn like(self, pattern: impl Into<String>) -> Join {
        let p = self.column.like(pattern);
        self.push(p)
    }

    /// `column IN (values)`.
    pub fn in_values(self, values: Vec<Value>) -> Join {
        let p = self.column.in_values(values);
        self.push(p)
    }

    /// `column IS NULL`.
    pub fn is_null(self) -> Join {
        let p = self.column.is_null();
        self.push(p)
    }

    /// `column IS NOT NULL`.
    pub fn is_not_null(self) -> Join {
        let p = self.column.is_not_null();
        self.push(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityType, ScalarDomain, SchemaRegistry};
    use crate::config::NamingConfig;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(NamingConfig::default());
        registry
            .declare("User", |h| {
                h.key("first_name", ScalarDomain::String)
                    .key("last_name", ScalarDomain::String);
            })
            .unwrap()
            .declare("Thing", |h| {
                h.key("id", ScalarDomain::Serial).reference("User");
            })
            .unwrap()
            .declare("Widget", |h| {
                h.key("id", ScalarDomain::Serial);
            })
            .unwrap()
            .finalize()
            .unwrap();
        registry
    }

    fn base(registry: &SchemaRegistry, name: &str) -> Arc<Heading> {
        Arc::clone(registry.entity(&EntityType::new(name)).unwrap().base())
    }

    #[test]
    fn test_paths_are_symmetric() {
        let registry = registry();
        let users = base(&registry, "User");
        let things = base(&registry, "Thing");

        let down = JoinPath::resolve(&users, &things).unwrap();
        let up = JoinPath::resolve(&things, &users).unwrap();
        assert!(matches!(down, JoinPath::ToChild(_)));
        assert!(matches!(up, JoinPath::ToParent(_)));

        let swapped: Vec<_> = up.pairs().into_iter().map(|(s, t)| (t, s)).collect();
        assert_eq!(down.pairs(), swapped);
    }

    #[test]
    fn test_unrelated_headings() {
        let registry = registry();
        let err = JoinPath::resolve(&base(&registry, "User"), &base(&registry, "Widget")).unwrap_err();
        assert_eq!(
            err,
            Error::NoJoinPath {
                from: "users".into(),
                to: "widgets".into()
            }
        );
    }

    #[test]
    fn test_join_condition_on_unknown_attribute() {
        let registry = registry();
        let join = Join::new("j1".into(), base(&registry, "Thing"), base(&registry, "User")).unwrap();
        let err = join.attr("age").unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { .. }));
    }

    #[test]
    fn test_join_condition_records_predicate() {
        let registry = registry();
        let join = Join::new("j1".into(), base(&registry, "Thing"), base(&registry, "User"))
            .unwrap()
            .attr("last_name")
            .unwrap()
            .like("Sm%");
        assert_eq!(join.predicates().len(), 1);
        assert_eq!(join.predicates()[0].to_string(), "j1.last_name LIKE \"Sm%\"");
        assert_eq!(
            join.on().iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            vec![
                "things.first_name = j1.first_name",
                "things.last_name = j1.last_name"
            ]
        );
    }
}
