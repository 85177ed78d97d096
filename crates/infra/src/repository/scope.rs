use std::borrow::Cow;

use serde_json::Value;

/// Equality constraints on top-level fields of a record's stored body.
///
/// A scope is a conjunction of clauses. A clause holds when any one of its
/// fields renders as its value. Backends that index those fields (Postgres)
/// evaluate the scope in the store instead of scanning every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Clause {
    pub(crate) fields: Vec<&'static str>,
    pub(crate) value: String,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(self, name: &'static str, value: impl ToString) -> Self {
        self.any_of(&[name], value)
    }

    /// Require at least one of `names` to equal `value`.
    pub fn any_of(mut self, names: &[&'static str], value: impl ToString) -> Self {
        self.clauses.push(Clause {
            fields: names.to_vec(),
            value: value.to_string(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub(crate) fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether a serialized body satisfies every clause.
    pub fn matches(&self, body: &Value) -> bool {
        self.clauses.iter().all(|clause| {
            clause.fields.iter().any(|field| {
                body.get(field)
                    .and_then(as_text)
                    .is_some_and(|text| text == clause.value)
            })
        })
    }
}

/// Text form of a JSON value, the way Postgres' `->>` renders it.
/// `null` has none and never matches.
fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s)),
        other => Some(Cow::Owned(other.to_string())),
    }
}
