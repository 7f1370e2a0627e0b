//! ARM network API types.
//!
//! Only the parts of a load balancer this provider reads or writes are
//! modelled; every other property is carried through untouched so that a
//! full-replacement update does not drop sibling configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A load balancer as returned by the ARM API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    /// Resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource type (`Microsoft.Network/loadBalancers`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Azure region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Entity tag used for optimistic concurrency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Resource tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    /// Load balancer properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<LoadBalancerProperties>,
    /// SKU, zones, extended location and any other top-level field.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Load balancer properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerProperties {
    /// Backend address pools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_address_pools: Option<Vec<BackendAddressPool>>,
    /// Provisioning state of the load balancer (read-only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    /// Resource GUID (read-only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
    /// Frontend IP configurations, rules, probes and anything else.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A backend address pool nested in a load balancer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddressPool {
    /// Resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Pool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Entity tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Pool properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BackendAddressPoolProperties>,
}

/// Backend address pool properties (all read-only from this provider's view).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddressPoolProperties {
    /// NIC IP configurations that reference this pool.
    #[serde(
        default,
        rename = "backendIPConfigurations",
        skip_serializing_if = "Option::is_none"
    )]
    pub backend_ip_configurations: Option<Vec<SubResource>>,
    /// Load balancing rules that use this pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_rules: Option<Vec<SubResource>>,
    /// Outbound NAT rule that uses this pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_nat_rule: Option<SubResource>,
    /// Provisioning state of the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Reference to another resource by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    /// Referenced resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Result of a create-or-update request.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    /// HTTP status returned by ARM (200 or 201).
    pub status: u16,
    /// `Azure-AsyncOperation` URL, if the operation continues asynchronously.
    pub async_operation_url: Option<String>,
    /// The resource as echoed back by the request.
    pub resource: Option<LoadBalancer>,
}

/// ARM error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorResponse {
    /// Error details.
    pub error: ArmErrorBody,
}

/// ARM error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorBody {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Provisioning state reported by ARM for an in-flight mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    /// Request accepted, work not started.
    Accepted,
    /// Update in progress.
    Updating,
    /// Operation completed.
    Succeeded,
    /// Operation failed.
    Failed,
    /// Deletion in progress.
    Deleting,
    /// Operation cancelled.
    Canceled,
    /// Any other state string.
    Other(String),
}

impl ProvisioningState {
    /// Parses a state string as reported by ARM.
    #[must_use]
    pub fn parse(state: &str) -> Self {
        match state {
            "Accepted" => Self::Accepted,
            "Updating" => Self::Updating,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            "Deleting" => Self::Deleting,
            "Canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the state string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accepted => "Accepted",
            Self::Updating => "Updating",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Deleting => "Deleting",
            Self::Canceled => "Canceled",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LoadBalancer {
    /// Returns the load balancer's provisioning state.
    #[must_use]
    pub fn provisioning_state(&self) -> Option<ProvisioningState> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
            .map(ProvisioningState::parse)
    }

    /// Returns the backend pools, or an empty slice.
    #[must_use]
    pub fn backend_pools(&self) -> &[BackendAddressPool] {
        self.properties
            .as_ref()
            .and_then(|p| p.backend_address_pools.as_deref())
            .unwrap_or_default()
    }

    /// Finds a backend pool by name (ARM names are case-insensitive).
    #[must_use]
    pub fn find_backend_pool(&self, name: &str) -> Option<&BackendAddressPool> {
        self.backend_pools().iter().find(|p| p.has_name(name))
    }
}

impl BackendAddressPool {
    /// Creates a pool with only a name set.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Returns true if the pool has the given name.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    /// Returns the IDs of the IP configurations referencing this pool.
    #[must_use]
    pub fn backend_ip_configuration_ids(&self) -> Vec<String> {
        self.properties
            .as_ref()
            .and_then(|p| p.backend_ip_configurations.as_ref())
            .map(|refs| sub_resource_ids(refs))
            .unwrap_or_default()
    }

    /// Returns the IDs of the load balancing rules using this pool.
    #[must_use]
    pub fn load_balancing_rule_ids(&self) -> Vec<String> {
        self.properties
            .as_ref()
            .and_then(|p| p.load_balancing_rules.as_ref())
            .map(|refs| sub_resource_ids(refs))
            .unwrap_or_default()
    }
}

fn sub_resource_ids(refs: &[SubResource]) -> Vec<String> {
    refs.iter().filter_map(|r| r.id.clone()).collect()
}
