//! The `azurerm_lb_backend_address_pool` resource.
//!
//! A backend address pool has no endpoint of its own: it lives inside its
//! load balancer. Every mutation therefore reads the load balancer, edits the
//! pool list and writes the whole load balancer back, then waits for the
//! load balancer's provisioning state to return to `Succeeded`.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::arm::{
    fetch_load_balancer, remove_backend_pool, upsert_backend_pool, BackendAddressPool,
    LoadBalancer, ResourceId,
};
use crate::error::{ArmError, LifecycleError, ProviderError, Result};
use crate::poller::StateWaiter;
use crate::schema::{normalize_location, FieldSchema, ResourceData, Schema};

use super::context::ProviderContext;
use super::ResourceHandler;

/// Resource type name registered with the host.
pub const RESOURCE_TYPE: &str = "azurerm_lb_backend_address_pool";

const NAME: &str = "name";
const LOCATION: &str = "location";
const RESOURCE_GROUP_NAME: &str = "resource_group_name";
const LOADBALANCER_ID: &str = "loadbalancer_id";
const BACKEND_IP_CONFIGURATIONS: &str = "backend_ip_configurations";
const LOAD_BALANCING_RULES: &str = "load_balancing_rules";

const LOAD_BALANCERS_SEGMENT: &str = "loadBalancers";
const POOLS_SEGMENT: &str = "backendAddressPools";

/// Provisioning states of a load balancer that is still applying a change.
const PENDING_STATES: [&str; 2] = ["Accepted", "Updating"];

/// Provisioning state of a load balancer that has applied a change.
const TARGET_STATES: [&str; 1] = ["Succeeded"];

/// Returns the schema of a backend address pool.
#[must_use]
pub fn backend_address_pool_schema() -> Schema {
    Schema::new(vec![
        FieldSchema::required_string(NAME),
        FieldSchema::required_string(LOCATION).normalized_with(normalize_location),
        FieldSchema::required_string(RESOURCE_GROUP_NAME),
        FieldSchema::required_string(LOADBALANCER_ID),
        FieldSchema::computed_set(BACKEND_IP_CONFIGURATIONS),
        FieldSchema::computed_set(LOAD_BALANCING_RULES),
    ])
}

/// Lifecycle handler for backend address pools.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendAddressPoolResource;

impl BackendAddressPoolResource {
    /// Creates the handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResourceHandler for BackendAddressPoolResource {
    async fn create(&self, data: &mut ResourceData, ctx: &ProviderContext) -> Result<()> {
        let name = required(data, NAME)?.to_string();
        let lb_id = ResourceId::parse(required(data, LOADBALANCER_ID)?)?;
        let lb_name = lb_id.require(LOAD_BALANCERS_SEGMENT)?.to_string();
        let resource_group = lb_id.resource_group().to_string();
        let api = ctx.load_balancers();

        let Some(current) = fetch_load_balancer(api, &lb_id).await? else {
            info!("Load balancer {lb_name} not found, removing backend address pool {name} from state");
            data.clear_id();
            return Ok(());
        };

        info!("Creating backend address pool {name} on load balancer {lb_name}");
        let request = upsert_backend_pool(&current, BackendAddressPool::named(&name));
        let handle = api
            .create_or_update(&resource_group, &lb_name, &request)
            .await
            .map_err(|e| {
                ProviderError::Lifecycle(LifecycleError::operation(
                    "creating backend address pool on load balancer",
                    &lb_name,
                    &resource_group,
                    e,
                ))
            })?;
        debug!("Update of load balancer {lb_name} accepted with status {}", handle.status);

        let updated = fetch_load_balancer(api, &lb_id)
            .await?
            .ok_or_else(|| inconsistent(&lb_name, &resource_group, "load balancer not found after update"))?;
        if updated.id.is_none() {
            return Err(inconsistent(&lb_name, &resource_group, "load balancer has no ID"));
        }
        let pool_id = updated
            .find_backend_pool(&name)
            .and_then(|p| p.id.clone())
            .ok_or_else(|| {
                inconsistent(
                    &name,
                    &resource_group,
                    &format!("backend address pool missing from load balancer {lb_name}"),
                )
            })?;

        data.set_id(pool_id);

        wait_until_settled(ctx, &lb_id, ctx.timeouts().create).await?;

        self.read(data, ctx).await
    }

    async fn read(&self, data: &mut ResourceData, ctx: &ProviderContext) -> Result<()> {
        let Some(raw_id) = data.id() else {
            return Ok(());
        };
        let id = ResourceId::parse(raw_id)?;

        let Some(load_balancer) = fetch_load_balancer(ctx.load_balancers(), &id).await? else {
            info!("Load balancer for {id} not found, removing backend address pool from state");
            data.clear_id();
            return Ok(());
        };

        let pool_name = pool_name(data, &id)?;
        let Some(pool) = load_balancer.find_backend_pool(&pool_name) else {
            info!("Backend address pool {pool_name} not found, removing from state");
            data.clear_id();
            return Ok(());
        };

        project(data, &id, &load_balancer, pool, &pool_name);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData, ctx: &ProviderContext) -> Result<()> {
        let Some(raw_id) = data.id() else {
            return Ok(());
        };
        let id = ResourceId::parse(raw_id)?;
        let lb_name = id.require(LOAD_BALANCERS_SEGMENT)?.to_string();
        let resource_group = id.resource_group().to_string();
        let api = ctx.load_balancers();

        let Some(current) = fetch_load_balancer(api, &id).await? else {
            info!("Load balancer {lb_name} already gone, removing backend address pool from state");
            data.clear_id();
            return Ok(());
        };

        let pool_name = pool_name(data, &id)?;
        if current.find_backend_pool(&pool_name).is_none() {
            info!("Backend address pool {pool_name} already gone, removing from state");
            data.clear_id();
            return Ok(());
        }

        info!("Deleting backend address pool {pool_name} from load balancer {lb_name}");
        let request = remove_backend_pool(&current, &pool_name);
        api.create_or_update(&resource_group, &lb_name, &request)
            .await
            .map_err(|e| {
                ProviderError::Lifecycle(LifecycleError::operation(
                    "deleting backend address pool from load balancer",
                    &lb_name,
                    &resource_group,
                    e,
                ))
            })?;

        wait_until_settled(ctx, &id, ctx.timeouts().delete).await?;

        data.clear_id();
        Ok(())
    }
}

/// Polls the load balancer behind `id` until its provisioning state settles.
async fn wait_until_settled(ctx: &ProviderContext, id: &ResourceId, timeout: Duration) -> Result<()> {
    let api = ctx.load_balancers();
    let lb_name = id.require(LOAD_BALANCERS_SEGMENT)?;

    StateWaiter::new(format!(
        "load balancer {lb_name} (resource group {})",
        id.resource_group()
    ))
    .pending(PENDING_STATES)
    .target(TARGET_STATES)
    .timeout(timeout)
    .interval(ctx.timeouts().poll_interval)
    .cancel_on(ctx.cancel_signal())
    .wait_for_state(|| async move {
        let load_balancer = fetch_load_balancer(api, id).await?.ok_or_else(|| {
            ProviderError::Arm(ArmError::ResourceNotFound { id: id.to_string() })
        })?;
        let state = load_balancer
            .provisioning_state()
            .map(|s| s.to_string())
            .unwrap_or_default();
        Ok(((), state))
    })
    .await
}

/// Writes the observed pool into `data`.
fn project(
    data: &mut ResourceData,
    id: &ResourceId,
    load_balancer: &LoadBalancer,
    pool: &BackendAddressPool,
    pool_name: &str,
) {
    let lb_id = load_balancer
        .id
        .clone()
        .or_else(|| id.parent().map(|p| p.to_string()))
        .unwrap_or_default();

    set_unless_same_ignoring_case(data, NAME, pool.name.as_deref().unwrap_or(pool_name));
    set_unless_same_ignoring_case(data, RESOURCE_GROUP_NAME, id.resource_group());
    set_unless_same_ignoring_case(data, LOADBALANCER_ID, &lb_id);
    if let Some(location) = load_balancer.location.as_deref() {
        data.set_str(LOCATION, normalize_location(location));
    }
    data.set_set(BACKEND_IP_CONFIGURATIONS, pool.backend_ip_configuration_ids());
    data.set_set(LOAD_BALANCING_RULES, pool.load_balancing_rule_ids());
}

/// ARM names and identifiers are case-insensitive; a value echoed back in
/// different case keeps the configured spelling.
fn set_unless_same_ignoring_case(data: &mut ResourceData, field: &str, observed: &str) {
    if data
        .get_str(field)
        .is_some_and(|current| current.eq_ignore_ascii_case(observed))
    {
        return;
    }
    data.set_str(field, observed);
}

/// The configured pool name, or the one embedded in the identifier.
fn pool_name(data: &ResourceData, id: &ResourceId) -> Result<String> {
    data.get_str(NAME)
        .or_else(|| id.path(POOLS_SEGMENT))
        .map(str::to_string)
        .ok_or_else(|| missing(NAME))
}

fn required<'a>(data: &'a ResourceData, field: &'static str) -> Result<&'a str> {
    data.get_str(field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field))
}

fn missing(field: &'static str) -> ProviderError {
    ProviderError::Lifecycle(LifecycleError::MissingField {
        field,
        resource: RESOURCE_TYPE.to_string(),
    })
}

fn inconsistent(resource: &str, resource_group: &str, reason: &str) -> ProviderError {
    ProviderError::Lifecycle(LifecycleError::InconsistentResponse {
        resource: resource.to_string(),
        resource_group: resource_group.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::{
        BackendAddressPoolProperties, LoadBalancerApi, LoadBalancerProperties, OperationHandle,
        SubResource,
    };
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const LB_ID: &str =
        "/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Network/loadBalancers/lb1";

    /// Answers reads from a script and records every update.
    #[derive(Default)]
    struct ScriptedApi {
        reads: Mutex<VecDeque<Option<LoadBalancer>>>,
        updates: Mutex<Vec<LoadBalancer>>,
    }

    impl ScriptedApi {
        fn with_reads(reads: Vec<Option<LoadBalancer>>) -> Arc<Self> {
            Arc::new(Self {
                reads: Mutex::new(reads.into()),
                updates: Mutex::default(),
            })
        }

        fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LoadBalancerApi for ScriptedApi {
        async fn get(&self, _: &str, _: &str) -> Result<Option<LoadBalancer>> {
            Ok(self.reads.lock().unwrap().pop_front().flatten())
        }

        async fn create_or_update(
            &self,
            _: &str,
            _: &str,
            load_balancer: &LoadBalancer,
        ) -> Result<OperationHandle> {
            self.updates.lock().unwrap().push(load_balancer.clone());
            Ok(OperationHandle {
                status: 200,
                async_operation_url: None,
                resource: None,
            })
        }
    }

    fn pool(name: &str, with_id: bool) -> BackendAddressPool {
        BackendAddressPool {
            id: with_id.then(|| format!("{LB_ID}/backendAddressPools/{name}")),
            name: Some(name.to_string()),
            etag: None,
            properties: Some(BackendAddressPoolProperties {
                backend_ip_configurations: Some(vec![SubResource {
                    id: Some(String::from("nic1-ipconfig1")),
                }]),
                load_balancing_rules: Some(vec![SubResource {
                    id: Some(String::from("rule-http")),
                }]),
                ..BackendAddressPoolProperties::default()
            }),
        }
    }

    fn lb(state: &str, pools: Vec<BackendAddressPool>) -> Option<LoadBalancer> {
        Some(LoadBalancer {
            id: Some(LB_ID.to_string()),
            name: Some(String::from("lb1")),
            location: Some(String::from("West US")),
            properties: Some(LoadBalancerProperties {
                backend_address_pools: Some(pools),
                provisioning_state: Some(state.to_string()),
                ..LoadBalancerProperties::default()
            }),
            ..LoadBalancer::default()
        })
    }

    fn config() -> ResourceData {
        ResourceData::from_strings([
            (NAME, "pool1"),
            (LOCATION, "westus"),
            (RESOURCE_GROUP_NAME, "rg1"),
            (LOADBALANCER_ID, LB_ID),
        ])
    }

    fn context(api: Arc<ScriptedApi>) -> ProviderContext {
        ProviderContext::new(api)
    }

    #[test]
    fn test_schema_matches_resource_fields() {
        let schema = backend_address_pool_schema();
        assert!(schema.validate(&config()).is_ok());
        assert_eq!(schema.fields().len(), 6);
        assert_eq!(schema.fields().iter().filter(|f| f.force_new).count(), 4);
    }

    #[tokio::test]
    async fn test_create_without_load_balancer_drops_state() {
        let api = ScriptedApi::with_reads(vec![None]);
        let mut data = config();
        data.set_id("stale");

        BackendAddressPoolResource
            .create(&mut data, &context(Arc::clone(&api)))
            .await
            .unwrap();

        assert!(data.id().is_none());
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn test_create_without_pool_id_is_inconsistent() {
        let api = ScriptedApi::with_reads(vec![
            lb("Succeeded", vec![]),
            lb("Updating", vec![pool("pool1", false)]),
        ]);
        let mut data = config();

        let err = BackendAddressPoolResource
            .create(&mut data, &context(Arc::clone(&api)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Lifecycle(LifecycleError::InconsistentResponse { .. })
        ));
        assert!(data.id().is_none());
        assert_eq!(api.update_count(), 1);
    }

    #[tokio::test]
    async fn test_read_projects_computed_fields_separately() {
        let api = ScriptedApi::with_reads(vec![lb("Succeeded", vec![pool("pool1", true)])]);
        let mut data = config();
        data.set_id(format!("{LB_ID}/backendAddressPools/pool1"));

        BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap();

        let ip_configs = data.get_set(BACKEND_IP_CONFIGURATIONS).unwrap();
        let rules = data.get_set(LOAD_BALANCING_RULES).unwrap();
        assert!(ip_configs.contains("nic1-ipconfig1"));
        assert!(!ip_configs.contains("rule-http"));
        assert!(rules.contains("rule-http"));
        assert_eq!(data.get_str(LOCATION), Some("westus"));
        assert_eq!(data.get_str(LOADBALANCER_ID), Some(LB_ID));
    }

    #[tokio::test]
    async fn test_read_keeps_configured_case_of_echoed_ids() {
        let echoed_lb = LB_ID.replace("resourceGroups/rg1", "resourceGroups/RG1");
        let mut echoed = lb("Succeeded", vec![pool("POOL1", true)]);
        if let Some(load_balancer) = echoed.as_mut() {
            load_balancer.id = Some(echoed_lb.clone());
        }
        let api = ScriptedApi::with_reads(vec![echoed]);
        let mut data = config();
        data.set_id(format!("{echoed_lb}/backendAddressPools/POOL1"));

        BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap();

        assert_eq!(data.get_str(NAME), Some("pool1"));
        assert_eq!(data.get_str(RESOURCE_GROUP_NAME), Some("rg1"));
        assert_eq!(data.get_str(LOADBALANCER_ID), Some(LB_ID));
        assert!(backend_address_pool_schema()
            .fields_requiring_replacement(&data, &config())
            .is_empty());
    }

    #[tokio::test]
    async fn test_read_reports_moved_load_balancer() {
        let moved = LB_ID.replace("loadBalancers/lb1", "loadBalancers/lb2");
        let mut observed = lb("Succeeded", vec![pool("pool1", true)]);
        if let Some(load_balancer) = observed.as_mut() {
            load_balancer.id = Some(moved.clone());
        }
        let api = ScriptedApi::with_reads(vec![observed]);
        let mut data = config();
        data.set_id(format!("{LB_ID}/backendAddressPools/pool1"));

        BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap();

        assert_eq!(data.get_str(LOADBALANCER_ID), Some(moved.as_str()));
        assert_eq!(
            backend_address_pool_schema().fields_requiring_replacement(&data, &config()),
            vec![LOADBALANCER_ID]
        );
    }

    #[tokio::test]
    async fn test_read_uses_pool_name_from_id() {
        let api = ScriptedApi::with_reads(vec![lb("Succeeded", vec![pool("pool1", true)])]);
        let mut data = ResourceData::new();
        data.set_id(format!("{LB_ID}/backendAddressPools/pool1"));

        BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap();

        assert_eq!(data.get_str(NAME), Some("pool1"));
        assert_eq!(data.get_str(RESOURCE_GROUP_NAME), Some("rg1"));
    }

    #[tokio::test]
    async fn test_read_missing_pool_drops_state() {
        let api = ScriptedApi::with_reads(vec![lb("Succeeded", vec![pool("other", true)])]);
        let mut data = config();
        data.set_id(format!("{LB_ID}/backendAddressPools/pool1"));

        BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap();

        assert!(data.id().is_none());
    }

    #[tokio::test]
    async fn test_read_without_id_does_nothing() {
        let api = ScriptedApi::with_reads(vec![]);
        let mut data = config();

        BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap();

        assert!(data.id().is_none());
        assert!(data.get_set(LOAD_BALANCING_RULES).is_none());
    }

    #[tokio::test]
    async fn test_delete_of_missing_pool_skips_update() {
        let api = ScriptedApi::with_reads(vec![lb("Succeeded", vec![pool("other", true)])]);
        let mut data = config();
        data.set_id(format!("{LB_ID}/backendAddressPools/pool1"));

        BackendAddressPoolResource
            .delete(&mut data, &context(Arc::clone(&api)))
            .await
            .unwrap();

        assert!(data.id().is_none());
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected() {
        let api = ScriptedApi::with_reads(vec![]);
        let mut data = config();
        data.set_id("not-an-id");

        let err = BackendAddressPoolResource
            .read(&mut data, &context(api))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Arm(ArmError::InvalidResourceId { .. })
        ));
    }
}
