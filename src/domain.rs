//! Domain conditions as consumed by the attr resolver.
//!
//! A domain is a serialized boolean expression in prefix list form, e.g.
//! `[["state", "=", "done"]]` or `["|", ["a", "=", 1], ["b", "!=", false]]`.
//! This crate does not interpret the grammar; evaluation is delegated to a
//! [`DomainEvaluator`] supplied by the embedding application.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A serialized domain, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Value);

impl Domain {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Whether the domain carries no condition at all (`[]` or `null`).
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Compact textual form, as sent to the client.
    pub fn to_text(&self) -> String {
        self.0.to_string()
    }
}

/// Tri-state outcome of evaluating a domain against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evaluation {
    True,
    False,
    /// The condition cannot be resolved here (e.g. it references a field
    /// that is not loaded); the client must evaluate it.
    Undetermined,
}

impl Evaluation {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Evaluation::True => Some(true),
            Evaluation::False => Some(false),
            Evaluation::Undetermined => None,
        }
    }
}

impl From<bool> for Evaluation {
    fn from(value: bool) -> Self {
        if value {
            Evaluation::True
        } else {
            Evaluation::False
        }
    }
}

/// Field values of the record currently bound to the view, keyed by
/// canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordContext {
    values: BTreeMap<String, Value>,
}

impl RecordContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Any other JSON value yields an empty context.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                values: map.into_iter().collect(),
            },
            _ => Self::default(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn is_loaded(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluates domains against a record. Implementations must be pure: the
/// same domain and record always give the same result.
pub trait DomainEvaluator {
    fn evaluate(&self, domain: &Domain, record: &RecordContext) -> Evaluation;
}

impl<F> DomainEvaluator for F
where
    F: Fn(&Domain, &RecordContext) -> Evaluation,
{
    fn evaluate(&self, domain: &Domain, record: &RecordContext) -> Evaluation {
        self(domain, record)
    }
}

/// Evaluator that resolves nothing: every condition stays dynamic and is
/// left for the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepDynamic;

impl DomainEvaluator for KeepDynamic {
    fn evaluate(&self, _domain: &Domain, _record: &RecordContext) -> Evaluation {
        Evaluation::Undetermined
    }
}
