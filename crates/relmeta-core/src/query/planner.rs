//! Query builder and query plans.
//!
//! The builder starts from an entity type's base heading, projects every
//! attribute of it, and collects joins and predicates. Joins are
//! deduplicated by identifier: asking for the same heading twice yields the
//! same join.

use super::join::Join;
use super::predicate::{ColumnRef, Condition, KeyArgs, KeyConstraint, Predicate};
use crate::catalog::{EntitySchema, EntityType, Heading, SchemaRegistry};
use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// A join edge of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinEdge {
    /// Join identifier, used as the joined relation's alias.
    pub id: String,
    /// Joined relation.
    pub relation: String,
    /// Join predicates, one per key attribute.
    pub on: Vec<Predicate>,
}

/// A query plan handed to an external executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Entity type the rows materialize into.
    pub entity: EntityType,
    /// Source relation.
    pub source: String,
    /// Projected columns. Always the full source heading.
    pub projection: Vec<ColumnRef>,
    /// Join edges in the order they were first added.
    pub joins: Vec<JoinEdge>,
    /// Predicates, all of which must hold.
    pub predicates: Vec<Predicate>,
}

impl QueryPlan {
    /// Get a join edge by identifier.
    pub fn join(&self, id: &str) -> Option<&JoinEdge> {
        self.joins.iter().find(|j| j.id == id)
    }
}

/// Builds a [`QueryPlan`] for one entity type.
#[derive(Debug)]
pub struct QueryBuilder<'r> {
    registry: &'r SchemaRegistry,
    schema: Arc<EntitySchema>,
    /// Join identifiers by joined heading name.
    join_ids: BTreeMap<String, String>,
    /// Identifiers of joins already in the plan.
    included: BTreeSet<String>,
    plan: QueryPlan,
}

impl<'r> QueryBuilder<'r> {
    /// Start a query on the base heading of `entity`.
    pub fn new(registry: &'r SchemaRegistry, entity: &EntityType) -> Result<Self> {
        let schema = Arc::clone(registry.entity(entity)?);
        let source = schema.base();
        let projection = source
            .attributes()
            .iter()
            .map(|a| ColumnRef::new(source.name(), a.name()))
            .collect();
        let plan = QueryPlan {
            entity: entity.clone(),
            source: source.name().to_string(),
            projection,
            joins: Vec::new(),
            predicates: Vec::new(),
        };
        Ok(Self {
            registry,
            schema,
            join_ids: BTreeMap::new(),
            included: BTreeSet::new(),
            plan,
        })
    }

    fn source(&self) -> &Arc<Heading> {
        self.schema.base()
    }

    /// A column of the source relation.
    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        self.source().attribute(name)?;
        Ok(ColumnRef::new(self.source().name(), name))
    }

    /// Join to the base heading of another entity type.
    pub fn reference(&mut self, entity: &EntityType) -> Result<Join> {
        let target = Arc::clone(self.registry.entity(entity)?.base());
        self.join_to(target)
    }

    /// Join to a child relation of this entity type.
    pub fn child(&mut self, path: &str) -> Result<Join> {
        let target = Arc::clone(self.schema.child(path)?);
        self.join_to(target)
    }

    /// Join to any heading related to the source.
    ///
    /// The identifier is allocated on first request and reused afterwards.
    pub fn join_to(&mut self, target: Arc<Heading>) -> Result<Join> {
        let id = match self.join_ids.get(target.name()) {
            Some(id) => id.clone(),
            None => format!("j{}", self.join_ids.len() + 1),
        };
        let join = Join::new(id.clone(), Arc::clone(self.source()), target)?;
        if !self.join_ids.contains_key(join.target().name()) {
            debug!(
                source = %self.plan.source,
                target = %join.target().name(),
                id = %id,
                "Resolved join"
            );
            self.join_ids.insert(join.target().name().to_string(), id);
        }
        Ok(join)
    }

    /// Add a join to the plan without predicates.
    pub fn include(&mut self, join: &Join) -> Result<&mut Self> {
        self.check_join(join)?;
        self.add_edge(join);
        Ok(self)
    }

    /// Add a condition to the plan.
    pub fn filter(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        match condition.into() {
            Condition::Predicate(predicate) => {
                self.plan.predicates.push(predicate);
            }
            Condition::Join(join) => {
                self.check_join(&join)?;
                self.add_edge(&join);
                self.plan.predicates.extend(join.predicates().iter().cloned());
            }
            Condition::Key(KeyConstraint { key, args }) => {
                self.find_by_key(&key, args)?;
            }
        }
        Ok(self)
    }

    /// Constrain the query to the row identified by a named key.
    ///
    /// Named arguments must name exactly the key's attributes; positional
    /// arguments must match its arity. Predicates follow key order.
    pub fn find_by_key(&mut self, key: &str, args: KeyArgs) -> Result<&mut Self> {
        let source = Arc::clone(self.source());
        let key = source.key(key)?;
        let names = key.attribute_names();

        let values: Vec<Value> = match args {
            KeyArgs::Named(mut map) => {
                let given: BTreeSet<&str> = map.keys().map(String::as_str).collect();
                let expected: BTreeSet<&str> = names.iter().copied().collect();
                if given != expected {
                    return Err(Error::missing_key(
                        source.name(),
                        key.name(),
                        format!("expected attributes {:?} but got {:?}", names, given),
                    ));
                }
                names
                    .iter()
                    .map(|n| map.remove(*n).unwrap_or(Value::Null))
                    .collect()
            }
            KeyArgs::Positional(values) => {
                if values.len() != key.arity() {
                    return Err(Error::missing_key(
                        source.name(),
                        key.name(),
                        format!("expected {} values but got {}", key.arity(), values.len()),
                    ));
                }
                values
            }
        };

        for (name, value) in names.iter().zip(values) {
            self.plan
                .predicates
                .push(ColumnRef::new(source.name(), *name).eq(value));
        }
        Ok(self)
    }

    /// Constrain the query with one equality per attribute.
    pub fn find_all(&mut self, attributes: BTreeMap<String, Value>) -> Result<&mut Self> {
        let predicates = attributes
            .into_iter()
            .map(|(name, value)| -> Result<Predicate> { Ok(self.column(&name)?.eq(value)) })
            .collect::<Result<Vec<_>>>()?;
        self.plan.predicates.extend(predicates);
        Ok(self)
    }

    /// The plan built so far.
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Finish building.
    pub fn build(self) -> QueryPlan {
        self.plan
    }

    /// A join is accepted only if this builder resolved it: same source,
    /// and the identifier this builder allocated for the target.
    fn check_join(&self, join: &Join) -> Result<()> {
        if join.source().name() != self.plan.source {
            return Err(Error::TypeMismatch {
                expected: self.plan.source.clone(),
                actual: join.source().name().to_string(),
            });
        }
        let allocated = self.join_ids.get(join.target().name()).map(String::as_str);
        if allocated != Some(join.id()) {
            return Err(Error::TypeMismatch {
                expected: format!(
                    "join {} of this query",
                    allocated.unwrap_or("<unresolved>")
                ),
                actual: format!("join {} to {}", join.id(), join.target().name()),
            });
        }
        Ok(())
    }

    fn add_edge(&mut self, join: &Join) {
        if self.included.insert(join.id().to_string()) {
            self.plan.joins.push(JoinEdge {
                id: join.id().to_string(),
                relation: join.target().name().to_string(),
                on: join.on(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarDomain;
    use crate::config::NamingConfig;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(NamingConfig::default());
        registry
            .declare("User", |h| {
                h.key("first_name", ScalarDomain::String)
                    .key("last_name", ScalarDomain::String)
                    .attribute("age", ScalarDomain::Integer);
            })
            .unwrap()
            .declare("Thing", |h| {
                h.key("id", ScalarDomain::Serial)
                    .attribute("name", ScalarDomain::String)
                    .reference("User")
                    .child("tags", |c| {
                        c.key("label", ScalarDomain::String);
                    });
            })
            .unwrap()
            .finalize()
            .unwrap();
        registry
    }

    #[test]
    fn test_projection_is_full_heading() {
        let registry = registry();
        let plan = QueryBuilder::new(&registry, &EntityType::new("Thing"))
            .unwrap()
            .build();
        let columns: Vec<_> = plan.projection.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            columns,
            vec!["things.id", "things.name", "things.first_name", "things.last_name"]
        );
        assert!(plan.joins.is_empty());
    }

    #[test]
    fn test_join_ids_are_reused() {
        let registry = registry();
        let user = EntityType::new("User");
        let mut query = QueryBuilder::new(&registry, &EntityType::new("Thing")).unwrap();

        let first = query.reference(&user).unwrap();
        let tags = query.child("tags").unwrap();
        let again = query.reference(&user).unwrap();
        assert_eq!(first.id(), "j1");
        assert_eq!(tags.id(), "j2");
        assert_eq!(again.id(), "j1");

        query
            .filter(first.attr("age").unwrap().gt(30))
            .unwrap()
            .filter(again.attr("age").unwrap().lt(60))
            .unwrap();
        let plan = query.build();
        assert_eq!(plan.joins.len(), 1);
        assert_eq!(plan.joins[0].relation, "users");
        assert_eq!(plan.predicates.len(), 2);
    }

    #[test]
    fn test_find_by_key_named_and_positional() {
        let registry = registry();
        let user = EntityType::new("User");

        let mut named = QueryBuilder::new(&registry, &user).unwrap();
        named
            .find_by_key(
                "primary",
                KeyArgs::named([("last_name", "Smith"), ("first_name", "John")]),
            )
            .unwrap();

        let mut positional = QueryBuilder::new(&registry, &user).unwrap();
        positional
            .filter(KeyConstraint::new(
                "primary",
                KeyArgs::positional(["John", "Smith"]),
            ))
            .unwrap();

        assert_eq!(named.plan().predicates, positional.plan().predicates);
        assert_eq!(
            named.plan().predicates[0],
            ColumnRef::new("users", "first_name").eq("John")
        );
    }

    #[test]
    fn test_find_by_key_mismatches() {
        let registry = registry();
        let mut query = QueryBuilder::new(&registry, &EntityType::new("User")).unwrap();

        let err = query
            .find_by_key("other", KeyArgs::positional(["John"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "key \"other\" on users: does not exist");

        let err = query
            .find_by_key("primary", KeyArgs::positional(["John"]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey { .. }));

        let err = query
            .find_by_key("primary", KeyArgs::named([("first_name", "John"), ("age", "x")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey { .. }));
        assert!(query.plan().predicates.is_empty());
    }

    #[test]
    fn test_find_all_is_atomic() {
        let registry = registry();
        let mut query = QueryBuilder::new(&registry, &EntityType::new("User")).unwrap();

        let mut attributes = BTreeMap::new();
        attributes.insert("age".to_string(), Value::Int(30));
        attributes.insert("nickname".to_string(), Value::from("JJ"));
        assert!(matches!(
            query.find_all(attributes).unwrap_err(),
            Error::InvalidAttribute { .. }
        ));
        assert!(query.plan().predicates.is_empty());

        let mut attributes = BTreeMap::new();
        attributes.insert("age".to_string(), Value::Int(30));
        query.find_all(attributes).unwrap();
        assert_eq!(query.plan().predicates, vec![ColumnRef::new("users", "age").eq(30)]);
    }

    #[test]
    fn test_join_from_other_builder_is_rejected() {
        let registry = registry();
        let mut users = QueryBuilder::new(&registry, &EntityType::new("User")).unwrap();
        let mut things = QueryBuilder::new(&registry, &EntityType::new("Thing")).unwrap();

        let join = things.reference(&EntityType::new("User")).unwrap();
        assert!(matches!(
            users.include(&join).unwrap_err(),
            Error::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_join_from_sibling_builder_on_same_entity_is_rejected() {
        let registry = registry();
        let thing = EntityType::new("Thing");
        let mut query = QueryBuilder::new(&registry, &thing).unwrap();
        let mut other = QueryBuilder::new(&registry, &thing).unwrap();

        let users = query.reference(&EntityType::new("User")).unwrap();
        let tags = other.child("tags").unwrap();
        assert_eq!(users.id(), tags.id());

        assert!(matches!(
            query.include(&tags).unwrap_err(),
            Error::TypeMismatch { .. }
        ));
        assert!(matches!(
            query.filter(tags.attr("label").unwrap().eq("x")).unwrap_err(),
            Error::TypeMismatch { .. }
        ));
        query.filter(users.attr("age").unwrap().gt(30)).unwrap();

        let plan = query.build();
        let joins: Vec<(&str, &str)> = plan
            .joins
            .iter()
            .map(|j| (j.id.as_str(), j.relation.as_str()))
            .collect();
        assert_eq!(joins, vec![("j1", "users")]);
        assert_eq!(plan.predicates.len(), 1);
        assert_eq!(plan.predicates[0].to_string(), "j1.age > 30");
    }

    #[test]
    fn test_plan_json() {
        let registry = registry();
        let mut query = QueryBuilder::new(&registry, &EntityType::new("User")).unwrap();
        let things = query.reference(&EntityType::new("Thing")).unwrap();
        query.include(&things).unwrap();
        let plan = query.build();

        let json = serde_json::to_string(&plan).unwrap();
        let back: QueryPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        assert_eq!(plan.join("j1").unwrap().on.len(), 2);
    }
}
