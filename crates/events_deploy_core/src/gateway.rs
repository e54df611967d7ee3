//! HTTP front door: REST API, proxy routes, stage deployment and invoke grant.
//!
//! There is no update path. Each call creates a new API container unless
//! `replace_existing` is set, in which case same-named APIs are deleted first.

use std::time::Duration;

use tracing::info;

use crate::error::{DeployError, DeployResult};
use crate::services::{AccountLookup, ComputeService, Creation, GatewayService};
use crate::specs::{GatewaySpec, IntegrationBinding, InvokePermission};
use crate::wait::Sleeper;

pub const PROXY_PATH_PART: &str = "{proxy+}";
pub const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";
pub const INVOKE_ACTION: &str = "lambda:InvokeFunction";
/// API Gateway accepts one DeleteRestApi call per 30 seconds per account.
pub const API_DELETE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayHandle {
    pub api_id: String,
    pub invocation_url: String,
}

pub fn ensure_gateway(
    gateway: &dyn GatewayService,
    compute: &dyn ComputeService,
    account: &dyn AccountLookup,
    sleeper: &dyn Sleeper,
    spec: &GatewaySpec,
    function_arn: &str,
) -> DeployResult<GatewayHandle> {
    if spec.replace_existing {
        teardown_gateways(gateway, sleeper, &spec.api_name)?;
    }

    info!(api = %spec.api_name, "creating REST API");
    let api_id = gateway
        .create_rest_api(&spec.api_name, &spec.description)
        .map_err(DeployError::Gateway)?;
    info!(api = %spec.api_name, %api_id, "REST API created");

    let binding = IntegrationBinding::lambda_proxy(spec.integration_uri(function_arn));

    let root_id = gateway
        .root_resource_id(&api_id)
        .map_err(DeployError::Gateway)?;
    bind_route(gateway, &api_id, &root_id, &binding)?;

    let proxy_id = gateway
        .create_resource(&api_id, &root_id, PROXY_PATH_PART)
        .map_err(DeployError::Gateway)?;
    bind_route(gateway, &api_id, &proxy_id, &binding)?;
    info!(%api_id, "routes bound to function");

    gateway
        .create_deployment(&api_id, &spec.stage_name)
        .map_err(DeployError::Gateway)?;
    info!(%api_id, stage = %spec.stage_name, "stage deployed");

    let account_id = account.account_id().map_err(DeployError::Gateway)?;
    let grant = InvokePermission {
        function: function_arn.to_string(),
        statement_id: format!("{}-{api_id}", spec.statement_id_prefix),
        action: INVOKE_ACTION.to_string(),
        principal: GATEWAY_PRINCIPAL.to_string(),
        source_arn: spec.source_arn(&account_id, &api_id),
    };
    match compute.add_permission(&grant).map_err(DeployError::Gateway)? {
        Creation::Created(()) => {
            info!(statement = %grant.statement_id, "invoke permission granted")
        }
        Creation::AlreadyExists => {
            info!(statement = %grant.statement_id, "permission already exists")
        }
    }

    Ok(GatewayHandle {
        invocation_url: spec.invocation_url(&api_id),
        api_id,
    })
}

fn bind_route(
    gateway: &dyn GatewayService,
    api_id: &str,
    resource_id: &str,
    binding: &IntegrationBinding,
) -> DeployResult<()> {
    gateway
        .put_method(
            api_id,
            resource_id,
            &binding.http_method,
            &binding.authorization,
        )
        .map_err(DeployError::Gateway)?;
    gateway
        .put_integration(api_id, resource_id, binding)
        .map_err(DeployError::Gateway)
}

/// Deletes every REST API named `api_name` and returns the deleted ids.
///
/// Consecutive deletes are spaced by [`API_DELETE_INTERVAL`].
pub fn teardown_gateways(
    gateway: &dyn GatewayService,
    sleeper: &dyn Sleeper,
    api_name: &str,
) -> DeployResult<Vec<String>> {
    info!(api = %api_name, "listing existing APIs");
    let matches: Vec<String> = gateway
        .list_rest_apis()
        .map_err(DeployError::Gateway)?
        .into_iter()
        .filter(|api| api.name == api_name)
        .map(|api| api.id)
        .collect();

    for (index, api_id) in matches.iter().enumerate() {
        if index > 0 {
            sleeper.sleep(API_DELETE_INTERVAL);
        }
        info!(%api_id, "deleting API");
        gateway
            .delete_rest_api(api_id)
            .map_err(DeployError::Gateway)?;
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeployConfig;
    use crate::test_helpers::{FakeCloud, RecordingSleeper, FAKE_ACCOUNT_ID};

    const FUNCTION_ARN: &str = "arn:aws:lambda:us-west-2:123456789012:function:EventsApiFunction";

    fn gateway_for(cloud: &FakeCloud, spec: &GatewaySpec) -> DeployResult<GatewayHandle> {
        ensure_gateway(cloud, cloud, cloud, &RecordingSleeper::default(), spec, FUNCTION_ARN)
    }

    fn position(calls: &[String], operation: &str, nth: usize) -> usize {
        calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.as_str() == operation)
            .nth(nth)
            .map(|(index, _)| index)
            .unwrap_or_else(|| panic!("{operation} #{nth} not called: {calls:?}"))
    }

    #[test]
    fn every_run_creates_a_new_api() {
        let cloud = FakeCloud::new();
        let spec = DeployConfig::default().gateway_spec();

        let first = gateway_for(&cloud, &spec).expect("first");
        let second = gateway_for(&cloud, &spec).expect("second");

        assert_ne!(first.api_id, second.api_id);
        assert_eq!(cloud.api_ids_named("EventsApi").len(), 2);
    }

    #[test]
    fn root_and_proxy_routes_reach_the_function() {
        let cloud = FakeCloud::new();
        let spec = DeployConfig::default().gateway_spec();

        let handle = gateway_for(&cloud, &spec).expect("gateway");

        assert_eq!(
            handle.invocation_url,
            format!("https://{}.execute-api.us-west-2.amazonaws.com/prod", handle.api_id)
        );
        for (method, path) in [("GET", "/"), ("POST", "/events"), ("DELETE", "/events/42")] {
            assert_eq!(
                cloud.route(&handle.api_id, "prod", method, path).as_deref(),
                Some(FUNCTION_ARN),
                "{method} {path}"
            );
        }
        assert_eq!(cloud.route(&handle.api_id, "dev", "GET", "/"), None);
    }

    #[test]
    fn routes_are_bound_before_deploy_and_grant_comes_last() {
        let cloud = FakeCloud::new();
        let spec = DeployConfig::default().gateway_spec();

        gateway_for(&cloud, &spec).expect("gateway");

        let calls = cloud.calls();
        let deployment = position(&calls, "CreateDeployment", 0);
        for route in 0..2 {
            let method = position(&calls, "PutMethod", route);
            let integration = position(&calls, "PutIntegration", route);
            assert!(method < integration, "route {route}: {calls:?}");
            assert!(integration < deployment, "route {route}: {calls:?}");
        }
        assert!(position(&calls, "CreateResource", 0) < position(&calls, "PutMethod", 1));
        assert!(deployment < position(&calls, "AddPermission", 0));
        assert_eq!(calls.last().map(String::as_str), Some("AddPermission"));
    }

    #[test]
    fn grant_is_scoped_to_the_new_api() {
        let cloud = FakeCloud::new();
        let spec = DeployConfig::default().gateway_spec();

        let handle = gateway_for(&cloud, &spec).expect("gateway");

        let permissions = cloud.permissions();
        assert_eq!(permissions.len(), 1);
        let grant = &permissions[0];
        assert_eq!(grant.function, FUNCTION_ARN);
        assert_eq!(grant.statement_id, format!("apigateway-invoke-{}", handle.api_id));
        assert_eq!(grant.principal, GATEWAY_PRINCIPAL);
        assert_eq!(grant.action, INVOKE_ACTION);
        assert_eq!(
            grant.source_arn,
            format!("arn:aws:execute-api:us-west-2:{FAKE_ACCOUNT_ID}:{}/*/*", handle.api_id)
        );
    }

    #[test]
    fn replace_existing_removes_older_apis() {
        let cloud = FakeCloud::new();
        let mut spec = DeployConfig::default().gateway_spec();
        let old = gateway_for(&cloud, &spec).expect("old");

        spec.replace_existing = true;
        let new = gateway_for(&cloud, &spec).expect("new");

        assert_eq!(cloud.api_ids_named("EventsApi"), vec![new.api_id]);
        assert_ne!(old.api_id, cloud.api_ids_named("EventsApi")[0]);
    }

    #[test]
    fn existing_permission_is_not_fatal() {
        let cloud = FakeCloud::new().with_existing_permissions();
        let spec = DeployConfig::default().gateway_spec();

        gateway_for(&cloud, &spec).expect("permission conflict tolerated");
    }

    #[test]
    fn teardown_only_touches_matching_names() {
        let cloud = FakeCloud::new();
        GatewayService::create_rest_api(&cloud, "EventsApi", "").expect("api");
        GatewayService::create_rest_api(&cloud, "OtherApi", "").expect("api");
        GatewayService::create_rest_api(&cloud, "EventsApi", "").expect("api");

        let deleted = teardown_gateways(&cloud, &RecordingSleeper::default(), "EventsApi")
            .expect("teardown");

        assert_eq!(deleted.len(), 2);
        assert!(cloud.api_ids_named("EventsApi").is_empty());
        assert_eq!(cloud.api_ids_named("OtherApi").len(), 1);
    }

    #[test]
    fn teardown_spaces_out_consecutive_deletes() {
        let cloud = FakeCloud::new();
        for _ in 0..3 {
            GatewayService::create_rest_api(&cloud, "EventsApi", "").expect("api");
        }
        let sleeper = RecordingSleeper::default();

        let deleted = teardown_gateways(&cloud, &sleeper, "EventsApi").expect("teardown");

        assert_eq!(deleted.len(), 3);
        assert_eq!(sleeper.delays(), vec![API_DELETE_INTERVAL; 2]);
    }

    #[test]
    fn single_delete_does_not_wait() {
        let cloud = FakeCloud::new();
        GatewayService::create_rest_api(&cloud, "EventsApi", "").expect("api");
        let sleeper = RecordingSleeper::default();

        teardown_gateways(&cloud, &sleeper, "EventsApi").expect("teardown");

        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn deployment_failure_skips_permission_grant() {
        let cloud = FakeCloud::new().fail_operation("CreateDeployment");
        let spec = DeployConfig::default().gateway_spec();

        let error = gateway_for(&cloud, &spec).expect_err("fatal");
        assert!(matches!(error, DeployError::Gateway(_)));
        assert_eq!(cloud.count_calls("AddPermission"), 0);
    }
}
