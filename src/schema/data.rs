//! Resource configuration values exchanged with the host.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A string value.
    Str(String),
    /// An unordered set of strings.
    Set(BTreeSet<String>),
}

/// Desired and observed configuration of one resource instance.
///
/// An absent ID means the resource is not (or no longer) tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Resource identifier assigned at create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Field values by name.
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
}

impl ResourceData {
    /// Creates empty resource data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resource data from string fields.
    #[must_use]
    pub fn from_strings<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut data = Self::new();
        for (name, value) in fields {
            data.set_str(name, value);
        }
        data
    }

    /// Returns the resource ID.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assigns the resource ID.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clears the resource ID, dropping the resource from state.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns a string field.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns a set field.
    #[must_use]
    pub fn get_set(&self, name: &str) -> Option<&BTreeSet<String>> {
        match self.fields.get(name) {
            Some(FieldValue::Set(s)) => Some(s),
            _ => None,
        }
    }

    /// Sets a string field.
    pub fn set_str(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .insert(name.to_string(), FieldValue::Str(value.into()));
    }

    /// Sets a set field.
    pub fn set_set<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.insert(
            name.to_string(),
            FieldValue::Set(values.into_iter().map(Into::into).collect()),
        );
    }

    /// Iterates over all fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
