//! Filter and partial-update documents.
//!
//! These are the conditional-update vocabulary shared by the projection
//! (which builds them) and the document store (which evaluates them).
//! Both serialize to the familiar Mongo-style JSON shape so a write-set
//! can be printed and inspected.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A condition on a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Condition {
    In {
        #[serde(rename = "$in")]
        any_of: Vec<Value>,
    },
    Eq(Value),
}

impl Condition {
    fn matches(&self, actual: Option<&Value>) -> bool {
        match (self, actual) {
            (Self::Eq(expected), Some(v)) => v == expected,
            (Self::In { any_of }, Some(v)) => any_of.contains(v),
            (_, None) => false,
        }
    }
}

/// Conjunction of field conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, Condition>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), Condition::Eq(value.into()));
        self
    }

    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let any_of = values.into_iter().map(Into::into).collect();
        self.0.insert(field.to_string(), Condition::In { any_of });
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, cond)| cond.matches(doc.get(field)))
    }

    /// If the filter pins `key_field` to a single string value, return it.
    /// The store uses this to look a document up by key instead of scanning.
    pub fn pinned_key(&self, key_field: &str) -> Option<&str> {
        match self.0.get(key_field) {
            Some(Condition::Eq(Value::String(s))) => Some(s),
            _ => None,
        }
    }
}

/// A partial update: fields to overwrite and decimal fields to increment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Update {
    #[serde(rename = "$set", skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    #[serde(rename = "$inc", skip_serializing_if = "BTreeMap::is_empty")]
    pub inc: BTreeMap<String, Decimal>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set.insert(field.to_string(), value.into());
        self
    }

    pub fn inc(mut self, field: &str, delta: Decimal) -> Self {
        *self.inc.entry(field.to_string()).or_default() += delta;
        self
    }

    /// Apply to `doc` in place. Returns `Ok(true)` if the document changed.
    ///
    /// `$inc` reads the current value as a decimal (string or number form,
    /// missing counts as zero) and writes the sum back in string form.
    /// An existing value that is not a decimal yields `Err(field)`.
    pub fn apply(&self, doc: &mut Value) -> Result<bool, String> {
        // The store only holds JSON objects.
        let Some(obj) = doc.as_object_mut() else {
            return Ok(false);
        };
        let mut changed = false;

        for (field, delta) in &self.inc {
            let current = match obj.get(field) {
                None | Some(Value::Null) => Decimal::ZERO,
                Some(v) => serde_json::from_value::<Decimal>(v.clone())
                    .map_err(|_| field.clone())?,
            };
            let next = current + *delta;
            if next != current || !obj.contains_key(field) {
                obj.insert(field.clone(), Value::String(next.to_string()));
                changed = true;
            }
        }

        for (field, value) in &self.set {
            if obj.get(field) != Some(value) {
                obj.insert(field.clone(), value.clone());
                changed = true;
            }
        }

        Ok(changed)
    }
}

/// One conditional write against a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    /// Update the first document matching `filter`.
    UpdateOne { filter: Filter, update: Update },
    /// Update every document matching `filter`.
    UpdateMany { filter: Filter, update: Update },
}

impl WriteOp {
    pub fn filter(&self) -> &Filter {
        match self {
            Self::UpdateOne { filter, .. } | Self::UpdateMany { filter, .. } => filter,
        }
    }

    pub fn update(&self) -> &Update {
        match self {
            Self::UpdateOne { update, .. } | Self::UpdateMany { update, .. } => update,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Self::UpdateMany { .. })
    }
}
