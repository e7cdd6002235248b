//! One-to-one and one-to-many child record proxies.

use super::attributes::Attributes;
use crate::catalog::{EntitySchema, EntityType, Heading};
use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// How a record handed to a [`RecordSink`] should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// The record has never been written.
    Create,
    /// The record was written before and some of its values changed.
    Update,
}

/// Persistence boundary for child records.
pub trait RecordSink {
    /// Persist one record.
    fn write(&mut self, record: &Attributes, kind: WriteKind) -> Result<()>;
}

impl RecordSink for Vec<(WriteKind, Attributes)> {
    fn write(&mut self, record: &Attributes, kind: WriteKind) -> Result<()> {
        self.push((kind, record.clone()));
        Ok(())
    }
}

/// Holds at most one record of a child relation. Repeated assignments merge
/// into it.
#[derive(Debug, Clone)]
pub struct OneProxy {
    attributes: Attributes,
    persisted: bool,
}

impl OneProxy {
    /// Merge values into the record.
    pub fn set<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.attributes.merge(pairs)
    }

    /// The record.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Check if the record has been written to a sink.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn flush(
        &mut self,
        entity: &EntityType,
        parent: &Attributes,
        sink: &mut dyn RecordSink,
    ) -> Result<usize> {
        self.attributes.set_reference(entity, parent)?;
        let kind = match (self.persisted, self.attributes.modified().next().is_some()) {
            (false, _) => WriteKind::Create,
            (true, true) => WriteKind::Update,
            (true, false) => return Ok(0),
        };
        sink.write(&self.attributes, kind)?;
        self.attributes.clear_modified();
        self.persisted = true;
        Ok(1)
    }
}

/// Accumulates records of a child relation.
#[derive(Debug, Clone)]
pub struct ManyProxy {
    heading: Arc<Heading>,
    records: Vec<Attributes>,
}

impl ManyProxy {
    /// Append a record.
    pub fn push<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let record = Attributes::with_defaults(Arc::clone(&self.heading), pairs)?;
        self.records.push(record);
        Ok(())
    }

    /// Pending records in insertion order. Records leave the proxy once
    /// written.
    pub fn records(&self) -> &[Attributes] {
        &self.records
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no pending records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn flush(
        &mut self,
        entity: &EntityType,
        parent: &Attributes,
        sink: &mut dyn RecordSink,
    ) -> Result<usize> {
        let mut written = 0;
        let result = self.records.iter_mut().try_for_each(|record| -> Result<()> {
            record.set_reference(entity, parent)?;
            sink.write(record, WriteKind::Create)?;
            written += 1;
            Ok(())
        });
        self.records.drain(..written);
        result.map(|()| written)
    }
}

#[derive(Debug, Clone)]
enum Proxy {
    One(OneProxy),
    Many(ManyProxy),
}

impl Proxy {
    fn kind(&self) -> &'static str {
        match self {
            Proxy::One(_) => "one-to-one",
            Proxy::Many(_) => "one-to-many",
        }
    }

    fn flush(
        &mut self,
        entity: &EntityType,
        parent: &Attributes,
        sink: &mut dyn RecordSink,
    ) -> Result<usize> {
        match self {
            Proxy::One(one) => one.flush(entity, parent, sink),
            Proxy::Many(many) => many.flush(entity, parent, sink),
        }
    }
}

/// Child record proxies of one entity, keyed by child relation name.
#[derive(Debug, Clone)]
pub struct Associations {
    schema: Arc<EntitySchema>,
    proxies: BTreeMap<String, Proxy>,
}

impl Associations {
    /// Create empty associations for an entity schema.
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            proxies: BTreeMap::new(),
        }
    }

    /// Check if `name` is a direct child relation of the entity.
    pub fn contains(&self, name: &str) -> bool {
        self.schema.direct_children().any(|h| h.path()[0] == name)
    }

    fn heading(&self, name: &str) -> Result<Arc<Heading>> {
        if !self.contains(name) {
            return Err(Error::UnknownRelation {
                entity: self.schema.entity_type().to_string(),
                relation: name.to_string(),
            });
        }
        Ok(Arc::clone(self.schema.child(name)?))
    }

    fn mismatch(name: &str, expected: &str, actual: &Proxy) -> Error {
        Error::TypeMismatch {
            expected: format!("{} association {}", expected, name),
            actual: format!("{} association {}", actual.kind(), name),
        }
    }

    /// The one-to-one proxy for a child relation.
    pub fn one(&mut self, name: &str) -> Result<&mut OneProxy> {
        if !self.proxies.contains_key(name) {
            let heading = self.heading(name)?;
            self.proxies.insert(
                name.to_string(),
                Proxy::One(OneProxy {
                    attributes: Attributes::new(heading),
                    persisted: false,
                }),
            );
        }
        match self.proxies.get_mut(name) {
            Some(Proxy::One(one)) => Ok(one),
            Some(other) => Err(Self::mismatch(name, "one-to-one", other)),
            None => Err(Error::UnknownRelation {
                entity: self.schema.entity_type().to_string(),
                relation: name.to_string(),
            }),
        }
    }

    /// The one-to-many proxy for a child relation.
    pub fn many(&mut self, name: &str) -> Result<&mut ManyProxy> {
        if !self.proxies.contains_key(name) {
            let heading = self.heading(name)?;
            self.proxies.insert(
                name.to_string(),
                Proxy::Many(ManyProxy {
                    heading,
                    records: Vec::new(),
                }),
            );
        }
        match self.proxies.get_mut(name) {
            Some(Proxy::Many(many)) => Ok(many),
            Some(other) => Err(Self::mismatch(name, "one-to-many", other)),
            None => Err(Error::UnknownRelation {
                entity: self.schema.entity_type().to_string(),
                relation: name.to_string(),
            }),
        }
    }

    /// Stamp every pending record with `parent` as its parent reference and
    /// hand it to `sink`. Returns the number of records written.
    ///
    /// One-to-many records are created and then leave their proxy. A
    /// one-to-one record is created on the first flush and afterwards only
    /// updated when one of its values changed. Stops at the first failure;
    /// records written before it are not written again.
    pub fn flush(&mut self, parent: &Attributes, sink: &mut dyn RecordSink) -> Result<usize> {
        let entity = self.schema.entity_type().clone();
        let mut written = 0;
        for (name, proxy) in self.proxies.iter_mut() {
            let count = proxy.flush(&entity, parent, sink)?;
            debug!(entity = %entity, association = %name, records = count, "Flushed association");
            written += count;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ScalarDomain, SchemaRegistry};
    use crate::config::NamingConfig;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(NamingConfig::default());
        registry
            .declare("Thing", |h| {
                h.key("id", ScalarDomain::Serial)
                    .child("detail", |c| {
                        c.attribute("color", ScalarDomain::String);
                    })
                    .child("tags", |c| {
                        c.key("label", ScalarDomain::String).child("notes", |n| {
                            n.attribute("body", ScalarDomain::Text);
                        });
                    });
            })
            .unwrap()
            .finalize()
            .unwrap();
        registry
    }

    fn associations(registry: &SchemaRegistry) -> (Associations, Attributes) {
        let schema = Arc::clone(registry.entity(&EntityType::new("Thing")).unwrap());
        let parent = Attributes::with_defaults(Arc::clone(schema.base()), [("id", 7)]).unwrap();
        (Associations::new(schema), parent)
    }

    #[test]
    fn test_one_merges_assignments() {
        let registry = registry();
        let (mut assoc, _) = associations(&registry);
        assoc.one("detail").unwrap().set([("color", "red")]).unwrap();
        assoc.one("detail").unwrap().set([("color", "blue")]).unwrap();

        let detail = assoc.one("detail").unwrap().attributes();
        assert_eq!(detail.get("color").unwrap(), &Value::from("blue"));
    }

    #[test]
    fn test_flush_stamps_parent_reference() {
        let registry = registry();
        let (mut assoc, parent) = associations(&registry);
        assoc.one("detail").unwrap().set([("color", "red")]).unwrap();
        let tags = assoc.many("tags").unwrap();
        tags.push([("label", "a")]).unwrap();
        tags.push([("label", "b")]).unwrap();
        assert_eq!(tags.len(), 2);

        let mut sink: Vec<(WriteKind, Attributes)> = Vec::new();
        assert_eq!(assoc.flush(&parent, &mut sink).unwrap(), 3);

        assert!(sink.iter().all(|(kind, record)| {
            *kind == WriteKind::Create && record.get("thing_id").unwrap() == &Value::Int(7)
        }));
        assert_eq!(sink[0].1.heading().name(), "thing_detail");
        assert_eq!(sink[1].1.get("label").unwrap(), &Value::from("a"));
    }

    #[test]
    fn test_second_flush_writes_only_changes() {
        let registry = registry();
        let (mut assoc, parent) = associations(&registry);
        assoc.one("detail").unwrap().set([("color", "red")]).unwrap();
        assoc.many("tags").unwrap().push([("label", "a")]).unwrap();

        let mut sink: Vec<(WriteKind, Attributes)> = Vec::new();
        assert_eq!(assoc.flush(&parent, &mut sink).unwrap(), 2);
        assert!(assoc.many("tags").unwrap().is_empty());
        assert!(assoc.one("detail").unwrap().is_persisted());

        assert_eq!(assoc.flush(&parent, &mut sink).unwrap(), 0);
        assert_eq!(sink.len(), 2);

        assoc.one("detail").unwrap().set([("color", "blue")]).unwrap();
        assoc.many("tags").unwrap().push([("label", "b")]).unwrap();
        assert_eq!(assoc.flush(&parent, &mut sink).unwrap(), 2);

        let kinds: Vec<(WriteKind, &str)> = sink
            .iter()
            .map(|(kind, record)| (*kind, record.heading().name()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (WriteKind::Create, "thing_detail"),
                (WriteKind::Create, "thing_tags"),
                (WriteKind::Update, "thing_detail"),
                (WriteKind::Create, "thing_tags"),
            ]
        );
        assert_eq!(sink[3].1.get("label").unwrap(), &Value::from("b"));
    }

    struct FailingSink {
        accepted: usize,
        writes: Vec<Attributes>,
    }

    impl RecordSink for FailingSink {
        fn write(&mut self, record: &Attributes, _kind: WriteKind) -> Result<()> {
            if self.writes.len() == self.accepted {
                return Err(Error::Sink("disk full".to_string()));
            }
            self.writes.push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn test_failed_flush_keeps_unwritten_records() {
        let registry = registry();
        let (mut assoc, parent) = associations(&registry);
        let tags = assoc.many("tags").unwrap();
        for label in ["a", "b", "c"] {
            tags.push([("label", label)]).unwrap();
        }

        let mut sink = FailingSink {
            accepted: 1,
            writes: Vec::new(),
        };
        assert_eq!(
            assoc.flush(&parent, &mut sink).unwrap_err(),
            Error::Sink("disk full".to_string())
        );
        let pending: Vec<&Value> = assoc
            .many("tags")
            .unwrap()
            .records()
            .iter()
            .map(|r| r.get("label").unwrap())
            .collect();
        assert_eq!(pending, vec![&Value::from("b"), &Value::from("c")]);
    }

    #[test]
    fn test_proxy_kind_is_fixed_per_name() {
        let registry = registry();
        let (mut assoc, _) = associations(&registry);
        assoc.many("tags").unwrap();
        assert!(matches!(
            assoc.one("tags").unwrap_err(),
            Error::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_unknown_and_nested_names() {
        let registry = registry();
        let (mut assoc, _) = associations(&registry);
        assert!(assoc.contains("tags"));
        assert!(!assoc.contains("tags.notes"));
        assert!(matches!(
            assoc.many("parts").unwrap_err(),
            Error::UnknownRelation { .. }
        ));
        assert!(matches!(
            assoc.many("tags.notes").unwrap_err(),
            Error::UnknownRelation { .. }
        ));
    }

    #[test]
    fn test_invalid_child_values() {
        let registry = registry();
        let (mut assoc, _) = associations(&registry);
        let tags = assoc.many("tags").unwrap();
        assert!(tags.push([("color", "red")]).is_err());
        assert!(tags.is_empty());
    }
}
