//! Configuration types for the provider.
//!
//! This module defines the structs that map to the `lbpool.yaml` file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::arm::{DEFAULT_API_VERSION, DEFAULT_AUTHORITY, DEFAULT_ENDPOINT};
use crate::resource::Timeouts;
use crate::schema::ResourceData;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// ARM connection settings.
    pub provider: AzureConfig,
    /// Operation deadlines.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Local state settings.
    #[serde(default)]
    pub state: StateConfig,
    /// Backend address pools to manage.
    #[serde(default)]
    pub backend_address_pools: Vec<BackendPoolConfig>,
}

/// ARM connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureConfig {
    /// Subscription every request is scoped to.
    #[serde(default)]
    pub subscription_id: String,
    /// Management endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Network API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Azure AD authority used for client-secret credentials.
    #[serde(default = "default_authority")]
    pub authority: String,
}

/// Operation deadlines, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutsConfig {
    /// Deadline for create to settle.
    #[serde(default = "default_operation_timeout")]
    pub create_secs: u64,
    /// Deadline for delete to settle.
    #[serde(default = "default_operation_timeout")]
    pub delete_secs: u64,
    /// Delay between provisioning-state probes.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout")]
    pub request_secs: u64,
}

/// Local state settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    /// Directory holding the state file.
    #[serde(default = "default_state_path")]
    pub path: String,
}

/// One backend address pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendPoolConfig {
    /// Pool name.
    pub name: String,
    /// Location of the load balancer.
    pub location: String,
    /// Resource group of the load balancer.
    pub resource_group_name: String,
    /// Full ARM ID of the load balancer.
    pub loadbalancer_id: String,
}

impl TimeoutsConfig {
    /// Converts to the timeouts used by lifecycle operations.
    #[must_use]
    pub const fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(self.create_secs),
            delete: Duration::from_secs(self.delete_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

impl BackendPoolConfig {
    /// Converts to the data passed to lifecycle operations.
    #[must_use]
    pub fn to_resource_data(&self) -> ResourceData {
        ResourceData::from_strings([
            ("name", self.name.as_str()),
            ("location", self.location.as_str()),
            ("resource_group_name", self.resource_group_name.as_str()),
            ("loadbalancer_id", self.loadbalancer_id.as_str()),
        ])
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            create_secs: default_operation_timeout(),
            delete_secs: default_operation_timeout(),
            poll_interval_secs: default_poll_interval(),
            request_secs: default_request_timeout(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

const fn default_operation_timeout() -> u64 {
    600
}

const fn default_poll_interval() -> u64 {
    5
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_state_path() -> String {
    String::from(".lbpool")
}
