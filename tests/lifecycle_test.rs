//! Lifecycle tests for the backend address pool resource against a mocked
//! load balancer API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lbpool::arm::{
    BackendAddressPool, BackendAddressPoolProperties, LoadBalancer, LoadBalancerApi,
    LoadBalancerProperties, OperationHandle, SubResource,
};
use lbpool::error::{ArmError, LifecycleError, PollError, ProviderError, Result};
use lbpool::poller::cancellation;
use lbpool::resource::{
    BackendAddressPoolResource, Provider, ProviderContext, ResourceHandler, Timeouts,
    RESOURCE_TYPE,
};
use lbpool::schema::ResourceData;
use mockall::mock;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

const LB_ID: &str =
    "/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Network/loadBalancers/lb1";

const INTERVAL: Duration = Duration::from_secs(5);

mock! {
    pub LoadBalancers {}

    #[async_trait]
    impl LoadBalancerApi for LoadBalancers {
        async fn get(&self, resource_group: &str, name: &str) -> Result<Option<LoadBalancer>>;

        async fn create_or_update(
            &self,
            resource_group: &str,
            name: &str,
            load_balancer: &LoadBalancer,
        ) -> Result<OperationHandle>;
    }
}

fn pool_id(name: &str) -> String {
    format!("{LB_ID}/backendAddressPools/{name}")
}

fn pool(name: &str) -> BackendAddressPool {
    BackendAddressPool {
        id: Some(pool_id(name)),
        name: Some(name.to_string()),
        etag: None,
        properties: None,
    }
}

fn referenced_pool(name: &str) -> BackendAddressPool {
    BackendAddressPool {
        properties: Some(BackendAddressPoolProperties {
            backend_ip_configurations: Some(vec![
                SubResource { id: Some(String::from("nic1-ipconfig1")) },
                SubResource { id: Some(String::from("nic2-ipconfig1")) },
            ]),
            load_balancing_rules: Some(vec![SubResource { id: Some(String::from("rule-http")) }]),
            ..BackendAddressPoolProperties::default()
        }),
        ..pool(name)
    }
}

fn lb(state: &str, pools: Vec<BackendAddressPool>) -> Option<LoadBalancer> {
    Some(LoadBalancer {
        id: Some(LB_ID.to_string()),
        name: Some(String::from("lb1")),
        location: Some(String::from("West US")),
        etag: Some(String::from("W/\"7\"")),
        properties: Some(LoadBalancerProperties {
            backend_address_pools: Some(pools),
            provisioning_state: Some(state.to_string()),
            ..LoadBalancerProperties::default()
        }),
        ..LoadBalancer::default()
    })
}

fn accepted() -> Result<OperationHandle> {
    Ok(OperationHandle {
        status: 200,
        async_operation_url: None,
        resource: None,
    })
}

/// Serves `reads` in order, one per `get` call.
fn expect_reads(api: &mut MockLoadBalancers, reads: Vec<Option<LoadBalancer>>) {
    let count = reads.len();
    let script = Mutex::new(VecDeque::from(reads));
    api.expect_get()
        .withf(|rg, name| rg.eq_ignore_ascii_case("rg1") && name.eq_ignore_ascii_case("lb1"))
        .times(count)
        .returning(move |_, _| Ok(script.lock().unwrap().pop_front().flatten()));
}

/// Records every update request.
fn expect_updates(api: &mut MockLoadBalancers, times: usize) -> Arc<Mutex<Vec<LoadBalancer>>> {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&sent);
    api.expect_create_or_update()
        .times(times)
        .returning(move |_, _, body| {
            recorder.lock().unwrap().push(body.clone());
            accepted()
        });
    sent
}

fn context(api: MockLoadBalancers) -> ProviderContext {
    ProviderContext::new(Arc::new(api)).with_timeouts(Timeouts {
        create: Duration::from_secs(60),
        delete: Duration::from_secs(60),
        poll_interval: INTERVAL,
    })
}

fn config() -> ResourceData {
    ResourceData::from_strings([
        ("name", "pool1"),
        ("location", "westus"),
        ("resource_group_name", "rg1"),
        ("loadbalancer_id", LB_ID),
    ])
}

fn tracked() -> ResourceData {
    let mut data = config();
    data.set_id(pool_id("pool1"));
    data
}

fn names(load_balancer: &LoadBalancer) -> Vec<&str> {
    load_balancer
        .backend_pools()
        .iter()
        .filter_map(|p| p.name.as_deref())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_create_polls_then_reads_back() {
    let mut api = MockLoadBalancers::new();
    expect_reads(
        &mut api,
        vec![
            // Initial read.
            lb("Succeeded", vec![pool("other")]),
            // Identifier lookup after the update.
            lb("Updating", vec![pool("other"), pool("pool1")]),
            // Three probes.
            lb("Updating", vec![pool("other"), pool("pool1")]),
            lb("Updating", vec![pool("other"), pool("pool1")]),
            lb("Succeeded", vec![pool("other"), pool("pool1")]),
            // Final read.
            lb("Succeeded", vec![pool("other"), referenced_pool("pool1")]),
        ],
    );
    let sent = expect_updates(&mut api, 1);

    let ctx = context(api);
    let mut data = config();
    let start = Instant::now();

    assert_ok!(BackendAddressPoolResource.create(&mut data, &ctx).await);

    assert_eq!(start.elapsed(), INTERVAL * 2);
    assert_eq!(data.id(), Some(pool_id("pool1").as_str()));
    assert_eq!(data.get_str("name"), Some("pool1"));
    assert_eq!(data.get_str("location"), Some("westus"));
    assert_eq!(data.get_str("loadbalancer_id"), Some(LB_ID));

    let ip_configs = data.get_set("backend_ip_configurations").unwrap();
    let rules = data.get_set("load_balancing_rules").unwrap();
    assert_eq!(ip_configs.len(), 2);
    assert!(ip_configs.contains("nic1-ipconfig1"));
    assert_eq!(rules.len(), 1);
    assert!(rules.contains("rule-http"));

    let sent = sent.lock().unwrap();
    assert_eq!(names(&sent[0]), vec!["other", "pool1"]);
    assert_eq!(sent[0].etag.as_deref(), Some("W/\"7\""));
    assert!(sent[0].id.is_none());
}

#[tokio::test]
async fn test_create_on_missing_load_balancer_drops_state() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![None]);
    api.expect_create_or_update().never();

    let mut data = config();
    assert_ok!(BackendAddressPoolResource.create(&mut data, &context(api)).await);
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_create_with_vanished_load_balancer_is_inconsistent() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![lb("Succeeded", vec![]), None]);
    expect_updates(&mut api, 1);

    let mut data = config();
    let err = assert_err!(BackendAddressPoolResource.create(&mut data, &context(api)).await);

    match err {
        ProviderError::Lifecycle(LifecycleError::InconsistentResponse {
            resource,
            resource_group,
            ..
        }) => {
            assert_eq!(resource, "lb1");
            assert_eq!(resource_group, "rg1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(data.id().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_create_failed_provisioning_keeps_id() {
    let mut api = MockLoadBalancers::new();
    expect_reads(
        &mut api,
        vec![
            lb("Succeeded", vec![]),
            lb("Updating", vec![pool("pool1")]),
            lb("Failed", vec![pool("pool1")]),
        ],
    );
    expect_updates(&mut api, 1);

    let mut data = config();
    let err = assert_err!(BackendAddressPoolResource.create(&mut data, &context(api)).await);

    assert!(matches!(
        err,
        ProviderError::Poll(PollError::UnexpectedState { ref state, .. }) if state == "Failed"
    ));
    assert_eq!(data.id(), Some(pool_id("pool1").as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_create_load_balancer_gone_while_polling() {
    let mut api = MockLoadBalancers::new();
    expect_reads(
        &mut api,
        vec![lb("Succeeded", vec![]), lb("Updating", vec![pool("pool1")]), None],
    );
    expect_updates(&mut api, 1);

    let mut data = config();
    let err = assert_err!(BackendAddressPoolResource.create(&mut data, &context(api)).await);

    assert!(matches!(err, ProviderError::Arm(ArmError::ResourceNotFound { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_create_cancelled_while_waiting() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![lb("Succeeded", vec![]), lb("Updating", vec![pool("pool1")])]);
    expect_updates(&mut api, 1);

    let (handle, signal) = cancellation();
    handle.cancel();
    let ctx = context(api).with_cancel(signal);

    let mut data = config();
    let err = assert_err!(BackendAddressPoolResource.create(&mut data, &ctx).await);

    assert!(err.is_cancelled());
    assert_eq!(data.id(), Some(pool_id("pool1").as_str()));
}

fn expect_rejected_update(api: &mut MockLoadBalancers) {
    api.expect_create_or_update()
        .times(1)
        .returning(|_, _, _| {
            Err(ProviderError::Arm(ArmError::api_error(
                400,
                "InvalidResourceReference",
                "frontend configuration not found",
            )))
        });
}

fn assert_names_load_balancer(err: &ProviderError) {
    assert!(matches!(
        err,
        ProviderError::Lifecycle(LifecycleError::Operation { resource, resource_group, .. })
            if resource == "lb1" && resource_group == "rg1"
    ));
    let message = err.to_string();
    assert!(message.contains("lb1"));
    assert!(message.contains("rg1"));
    assert!(message.contains("InvalidResourceReference"));
}

#[tokio::test(start_paused = true)]
async fn test_create_rejected_update_stops_before_polling() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![lb("Succeeded", vec![pool("other")])]);
    expect_rejected_update(&mut api);

    let mut data = config();
    let start = Instant::now();
    let err = assert_err!(BackendAddressPoolResource.create(&mut data, &context(api)).await);

    assert_names_load_balancer(&err);
    assert!(!err.is_retryable());
    assert!(data.id().is_none());
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_delete_rejected_update_keeps_id() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![lb("Succeeded", vec![pool("other"), pool("pool1")])]);
    expect_rejected_update(&mut api);

    let mut data = tracked();
    let start = Instant::now();
    let err = assert_err!(BackendAddressPoolResource.delete(&mut data, &context(api)).await);

    assert_names_load_balancer(&err);
    assert_eq!(data.id(), Some(pool_id("pool1").as_str()));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_read_after_load_balancer_deleted_drops_state() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![None]);

    let mut data = tracked();
    assert_ok!(BackendAddressPoolResource.read(&mut data, &context(api)).await);
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_read_error_names_load_balancer() {
    let mut api = MockLoadBalancers::new();
    api.expect_get()
        .times(1)
        .returning(|_, _| Err(ProviderError::Arm(ArmError::network("connection reset"))));

    let mut data = tracked();
    let err = assert_err!(BackendAddressPoolResource.read(&mut data, &context(api)).await);

    let message = err.to_string();
    assert!(message.contains("lb1"));
    assert!(message.contains("rg1"));
    assert!(err.is_retryable());
    assert!(data.id().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_delete_removes_only_target_pool() {
    let mut api = MockLoadBalancers::new();
    expect_reads(
        &mut api,
        vec![
            lb("Succeeded", vec![pool("other"), pool("pool1")]),
            lb("Updating", vec![pool("other")]),
            lb("Succeeded", vec![pool("other")]),
        ],
    );
    let sent = expect_updates(&mut api, 1);

    let mut data = tracked();
    assert_ok!(BackendAddressPoolResource.delete(&mut data, &context(api)).await);

    assert!(data.id().is_none());
    let sent = sent.lock().unwrap();
    assert_eq!(names(&sent[0]), vec!["other"]);
}

#[tokio::test]
async fn test_delete_after_load_balancer_deleted() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![None]);
    api.expect_create_or_update().never();

    let mut data = tracked();
    assert_ok!(BackendAddressPoolResource.delete(&mut data, &context(api)).await);
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_registry_dispatches_to_handler() {
    let mut api = MockLoadBalancers::new();
    expect_reads(&mut api, vec![lb("Succeeded", vec![referenced_pool("pool1")])]);

    let provider = Provider::new();
    let definition = provider.resource(RESOURCE_TYPE).unwrap();

    let mut data = tracked();
    assert_ok!(definition.schema.validate(&config()));
    assert_ok!(definition.handler.read(&mut data, &context(api)).await);
    assert_eq!(data.get_set("load_balancing_rules").map(|s| s.len()), Some(1));
}
