//! The load balancer operations the lifecycle handler depends on.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{LifecycleError, ProviderError, Result};

use super::resource_id::ResourceId;
use super::types::{LoadBalancer, OperationHandle};

/// Read and full-replacement update of load balancers.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Reads a load balancer.
    ///
    /// Returns `Ok(None)` when the API reports that it does not exist.
    async fn get(&self, resource_group: &str, name: &str) -> Result<Option<LoadBalancer>>;

    /// Submits a full-replacement update of a load balancer.
    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        load_balancer: &LoadBalancer,
    ) -> Result<OperationHandle>;
}

/// Looks up the load balancer an identifier points at (or is nested in).
///
/// Not-found is `Ok(None)`; any other failure is returned with the load
/// balancer name and resource group attached.
///
/// # Errors
///
/// Returns an error if the identifier has no `loadBalancers` segment or the
/// read request fails.
pub async fn fetch_load_balancer(
    api: &dyn LoadBalancerApi,
    id: &ResourceId,
) -> Result<Option<LoadBalancer>> {
    let name = id.require("loadBalancers")?;
    let resource_group = id.resource_group();

    debug!("Reading load balancer {name} (resource group {resource_group})");

    api.get(resource_group, name).await.map_err(|e| {
        ProviderError::Lifecycle(LifecycleError::operation(
            "making Read request on load balancer",
            name,
            resource_group,
            e,
        ))
    })
}
