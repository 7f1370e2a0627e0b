//! Request builders for full-replacement load balancer updates.
//!
//! ARM replaces the whole load balancer on `PUT`, so an update must carry
//! everything that should survive it. These helpers start from the current
//! object and change exactly one backend pool.

use super::types::{BackendAddressPool, LoadBalancer, LoadBalancerProperties};

/// Builds the base of an update request from the current load balancer.
///
/// Identity fields (name, entity tag, location), tags and unmodelled
/// top-level fields such as `sku` are always kept. Writable properties are
/// carried over; read-only ones are dropped.
#[must_use]
pub fn merge_load_balancer_config(current: &LoadBalancer) -> LoadBalancer {
    let properties = current
        .properties
        .as_ref()
        .map(|p| LoadBalancerProperties {
            backend_address_pools: p.backend_address_pools.clone(),
            provisioning_state: None,
            resource_guid: None,
            other: p.other.clone(),
        });

    LoadBalancer {
        id: None,
        name: current.name.clone(),
        resource_type: None,
        location: current.location.clone(),
        etag: current.etag.clone(),
        tags: current.tags.clone(),
        properties,
        other: current.other.clone(),
    }
}

/// Returns an update request with `pool` added, replacing any pool of the
/// same name. Every other pool keeps its position.
#[must_use]
pub fn upsert_backend_pool(current: &LoadBalancer, pool: BackendAddressPool) -> LoadBalancer {
    let mut merged = merge_load_balancer_config(current);
    let pools = merged
        .properties
        .get_or_insert_with(LoadBalancerProperties::default)
        .backend_address_pools
        .get_or_insert_with(Vec::new);

    let name = pool.name.clone().unwrap_or_default();
    if let Some(index) = pools.iter().position(|p| p.has_name(&name)) {
        pools[index] = pool;
    } else {
        pools.push(pool);
    }

    merged
}

/// Returns an update request without the pool called `name`.
#[must_use]
pub fn remove_backend_pool(current: &LoadBalancer, name: &str) -> LoadBalancer {
    let mut merged = merge_load_balancer_config(current);
    if let Some(pools) = merged
        .properties
        .as_mut()
        .and_then(|p| p.backend_address_pools.as_mut())
    {
        pools.retain(|p| !p.has_name(name));
    }
    merged
}
