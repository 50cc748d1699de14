//! Exact-match field predicates for store scans.

use std::collections::BTreeMap;

use docmodel_core::builtin::field;
use docmodel_core::{Document, Value};

/// A conjunction of `field == value` tests.
///
/// An empty query matches every document. The reserved `_id` field can be
/// matched like any attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    fields: BTreeMap<String, Value>,
}

impl Query {
    /// A query that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name` to equal `value`.
    pub fn eq(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `(field, value)` pairs this query tests.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.fields.iter().all(|(name, expected)| {
            if name == field::ID {
                expected.as_str() == Some(doc.id.as_str())
            } else {
                doc.attribute(name) == Some(expected)
            }
        })
    }
}

impl From<BTreeMap<String, Value>> for Query {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}
