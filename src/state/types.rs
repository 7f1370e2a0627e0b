//! State types for tracking managed resources.
//!
//! These types record the identifier and last observed attributes of each
//! backend address pool between CLI invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{FieldValue, ResourceData};

/// Current version of the state format.
pub const STATE_VERSION: &str = "1.0";

/// Keep only this many history entries.
const MAX_HISTORY: usize = 100;

/// The complete provider state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderState {
    /// State format version.
    pub version: String,
    /// Tracked resources by configured name.
    pub resources: BTreeMap<String, ResourceState>,
    /// When the state was last updated.
    pub last_updated: DateTime<Utc>,
    /// Operation history (recent entries).
    #[serde(default)]
    pub history: Vec<OperationHistoryEntry>,
}

/// State of a single resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceState {
    /// Resource type name.
    pub resource_type: String,
    /// Configured name.
    pub name: String,
    /// Remote identifier recorded at create.
    pub id: String,
    /// Last observed attributes.
    pub attributes: BTreeMap<String, FieldValue>,
    /// When the resource was last written.
    pub updated_at: DateTime<Utc>,
}

/// A single entry in the operation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationHistoryEntry {
    /// When the operation finished.
    pub timestamp: DateTime<Utc>,
    /// Type of operation.
    pub operation: LifecycleOperation,
    /// Resource the operation ran on.
    pub resource: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Optional error message.
    #[serde(default)]
    pub error: Option<String>,
}

/// Lifecycle operations recorded in history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOperation {
    /// Create.
    Create,
    /// Read.
    Read,
    /// Delete.
    Delete,
}

impl ProviderState {
    /// Creates a new empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Gets a resource by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.resources.get(name)
    }

    /// Records the outcome of a lifecycle callback.
    ///
    /// Stores the data if it still carries an ID and forgets the resource
    /// otherwise. Returns true if the resource is still tracked.
    pub fn record(&mut self, resource_type: &str, name: &str, data: &ResourceData) -> bool {
        self.last_updated = Utc::now();
        match ResourceState::from_data(resource_type, name, data) {
            Some(resource) => {
                self.resources.insert(name.to_string(), resource);
                true
            }
            None => {
                self.resources.remove(name);
                false
            }
        }
    }

    /// Adds a history entry.
    pub fn add_history(&mut self, entry: OperationHistoryEntry) {
        if self.history.len() >= MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(entry);
    }

    /// Returns all tracked resource names.
    #[must_use]
    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }
}

impl Default for ProviderState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceState {
    /// Captures resource data. Returns `None` if the data has no ID.
    #[must_use]
    pub fn from_data(resource_type: &str, name: &str, data: &ResourceData) -> Option<Self> {
        let id = data.id()?;
        Some(Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            attributes: data
                .fields()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            updated_at: Utc::now(),
        })
    }

    /// Rebuilds the resource data handed to lifecycle callbacks.
    #[must_use]
    pub fn to_data(&self) -> ResourceData {
        let mut data = ResourceData::new();
        for (name, value) in &self.attributes {
            match value {
                FieldValue::Str(s) => data.set_str(name, s.as_str()),
                FieldValue::Set(values) => data.set_set(name, values.iter().cloned()),
            }
        }
        data.set_id(self.id.as_str());
        data
    }
}

impl OperationHistoryEntry {
    /// Creates a successful history entry.
    #[must_use]
    pub fn new(operation: LifecycleOperation, resource: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            resource: resource.to_string(),
            success: true,
            error: None,
        }
    }

    /// Creates a failed history entry.
    #[must_use]
    pub fn failed(operation: LifecycleOperation, resource: &str, error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::new(operation, resource)
        }
    }
}

impl std::fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Delete => "delete",
        };
        write!(f, "{op}")
    }
}
