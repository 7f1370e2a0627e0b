//! Azure Resource Manager integration module.
//!
//! This module provides everything needed to talk to the ARM management API
//! about load balancers: identifiers, wire types, credentials, the HTTP
//! client and the full-replacement merge helpers.

mod api;
mod client;
mod credentials;
mod merge;
mod resource_id;
mod types;

pub use api::{fetch_load_balancer, LoadBalancerApi};
pub use client::{ArmClient, DEFAULT_API_VERSION, DEFAULT_AUTHORITY, DEFAULT_ENDPOINT};
pub use credentials::{
    management_scope, BearerToken, Credentials, ENV_ACCESS_TOKEN, ENV_CLIENT_ID,
    ENV_CLIENT_SECRET, ENV_TENANT_ID,
};
pub use merge::{merge_load_balancer_config, remove_backend_pool, upsert_backend_pool};
pub use resource_id::ResourceId;
pub use types::{
    ArmErrorBody, ArmErrorResponse, BackendAddressPool, BackendAddressPoolProperties,
    LoadBalancer, LoadBalancerProperties, OperationHandle, ProvisioningState, SubResource,
};
