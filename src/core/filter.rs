//! Query expressions over documents
//!
//! Filters are a small tagged expression tree: equality and membership clauses
//! combined with `Or` / `And`. That is all the cascade needs, and it is enough
//! for controllers to express "this id" and "these ids".
//!
//! Matching follows document-database semantics:
//! - a missing field equals `null`
//! - a clause against an array field matches when any element matches
//! - an empty `Or` matches nothing, an empty `And` matches everything

use crate::core::entity::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Comparison operator of a [`Clause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Field value equals the clause value
    Equals,
    /// Field value is one of the values in the clause array
    In,
}

/// A single `field <op> value` test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

/// A filter over documents of one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Clause(Clause),
    Or(Vec<Filter>),
    And(Vec<Filter>),
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Clause(Clause {
            field: field.into(),
            op: Operator::Equals,
            value: value.into(),
        })
    }

    /// `field IN values`
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::Clause(Clause {
            field: field.into(),
            op: Operator::In,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        })
    }

    /// Logical OR of `filters`
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Logical AND of `filters`
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// OR across `fields`, each testing membership in `values`
    ///
    /// This is the shape of every dependent lookup: a record depends on the
    /// root if any of its reference fields points at one of the root ids.
    pub fn any_field_in<F>(fields: &[F], values: &[Value]) -> Self
    where
        F: AsRef<str>,
    {
        Filter::Or(
            fields
                .iter()
                .map(|field| Filter::is_in(field.as_ref(), values.iter().cloned()))
                .collect(),
        )
    }

    /// Evaluate the filter against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Clause(clause) => clause.matches(doc),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }

    /// Render as a document-database query (`$or`, `$and`, `$in`)
    ///
    /// Used for logging and by backends that speak this query dialect.
    pub fn to_query(&self) -> Value {
        match self {
            Filter::Clause(Clause { field, op, value }) => match op {
                Operator::Equals => single_key(field, value.clone()),
                Operator::In => single_key(field, json!({ "$in": value })),
            },
            Filter::Or(filters) => {
                json!({ "$or": filters.iter().map(Filter::to_query).collect::<Vec<_>>() })
            }
            Filter::And(filters) if filters.is_empty() => json!({}),
            Filter::And(filters) => {
                json!({ "$and": filters.iter().map(Filter::to_query).collect::<Vec<_>>() })
            }
        }
    }
}

impl Clause {
    fn matches(&self, doc: &Document) -> bool {
        let field_value = lookup(doc, &self.field).unwrap_or(&Value::Null);
        match self.op {
            Operator::Equals => value_matches(field_value, |v| v == &self.value),
            Operator::In => match &self.value {
                Value::Array(candidates) => {
                    value_matches(field_value, |v| candidates.iter().any(|c| c == v))
                }
                _ => false,
            },
        }
    }
}

fn single_key(key: &str, value: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Resolve a possibly dotted field path
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn value_matches(field_value: &Value, pred: impl Fn(&Value) -> bool) -> bool {
    if pred(field_value) {
        return true;
    }
    match field_value {
        Value::Array(items) => items.iter().any(pred),
        _ => false,
    }
}
