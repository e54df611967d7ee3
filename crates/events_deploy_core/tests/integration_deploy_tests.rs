mod support;

use std::collections::BTreeSet;

use events_deploy_core::delivery::DeliveryStrategy;
use events_deploy_core::function::FunctionOutcome;
use events_deploy_core::policy::TABLE_DATA_ACTIONS;
use events_deploy_core::services::{TableService, TableStatus};
use events_deploy_core::test_helpers::{
    FailingResolver, FakeCloud, RecordingSleeper, StaticResolver,
};
use events_deploy_core::{run_deploy, DeployConfig, DeployError, DeploymentReport, Services};
use support::workspace::{exists, TestWorkspace};

const TWO_MIB: usize = 2 * 1024 * 1024;

fn deploy(cloud: &FakeCloud, config: &DeployConfig) -> Result<DeploymentReport, DeployError> {
    let resolver = StaticResolver::new(vec![("mangum/__init__.py", "")]);
    let sleeper = RecordingSleeper::default();
    run_deploy(config, &Services::from_cloud(cloud, &resolver, &sleeper))
}

#[test]
fn fresh_account_deploys_reachable_api() {
    let workspace = TestWorkspace::new().with_incompressible_source("payload.py", TWO_MIB);
    let cloud = FakeCloud::new()
        .with_table_pending_polls(2)
        .with_role_visibility_lag(1);

    let report = deploy(&cloud, &workspace.config()).expect("deploy");

    assert_eq!(report.table_name, "EventsTable");
    assert_eq!(
        TableService::table_status(&cloud, "EventsTable").expect("status"),
        TableStatus::Active
    );

    let role = cloud.role("EventsApiLambdaRole").expect("role created");
    let policy = role.inline_policies.get("DynamoDBAccess").expect("inline policy");
    let actions: BTreeSet<&str> = policy.statement[0].action.values().into_iter().collect();
    assert_eq!(actions, TABLE_DATA_ACTIONS.into_iter().collect());

    let function = cloud.function("EventsApiFunction").expect("function created");
    assert_eq!(
        function.configuration.environment.get("DYNAMODB_TABLE").map(String::as_str),
        Some("EventsTable")
    );
    assert_eq!(report.function_outcome, FunctionOutcome::Created);
    assert_eq!(report.delivery, DeliveryStrategy::Inline);
    assert!(report.artifact_size_bytes >= TWO_MIB as u64);

    assert_eq!(
        cloud.route(&report.api_id, "prod", "GET", "/").as_deref(),
        Some(report.function_arn.as_str())
    );
    assert_eq!(
        report.invocation_url,
        format!("https://{}.execute-api.us-west-2.amazonaws.com/prod", report.api_id)
    );
    assert!(!exists(&workspace.artifact_path()));
}

#[test]
fn fresh_deploy_runs_stages_in_dependency_order() {
    let workspace = TestWorkspace::new();
    let cloud = FakeCloud::new();

    deploy(&cloud, &workspace.config()).expect("deploy");

    assert_eq!(
        cloud.calls(),
        [
            "CreateTable",
            "DescribeTable",
            "CreateRole",
            "AttachRolePolicy",
            "PutRolePolicy",
            "GetRole",
            "CreateFunction",
            "GetFunctionConfiguration",
            "CreateRestApi",
            "GetResources",
            "PutMethod",
            "PutIntegration",
            "CreateResource",
            "PutMethod",
            "PutIntegration",
            "CreateDeployment",
            "GetCallerIdentity",
            "AddPermission",
        ]
    );
}

#[test]
fn rerun_converges_environment_without_duplicating_resources() {
    let workspace = TestWorkspace::new();
    let mut config = workspace.config();
    let cloud = FakeCloud::new();

    config.extra_environment.insert("X".to_string(), "1".to_string());
    let first = deploy(&cloud, &config).expect("first run");
    config.extra_environment.insert("X".to_string(), "2".to_string());
    let second = deploy(&cloud, &config).expect("second run");

    assert_eq!(second.function_outcome, FunctionOutcome::Updated);
    assert_eq!(first.function_arn, second.function_arn);
    assert_eq!(cloud.table_count(), 1);
    assert_eq!(cloud.function_count(), 1);
    let environment = cloud
        .function("EventsApiFunction")
        .expect("function")
        .configuration
        .environment;
    assert_eq!(environment.get("X").map(String::as_str), Some("2"));
    assert_eq!(
        environment.get("DYNAMODB_TABLE").map(String::as_str),
        Some("EventsTable")
    );
    // Policies go on only when the role is first created.
    assert_eq!(cloud.count_calls("AttachRolePolicy"), 1);
}

#[test]
fn rerun_creates_a_second_gateway() {
    let workspace = TestWorkspace::new();
    let cloud = FakeCloud::new();

    let first = deploy(&cloud, &workspace.config()).expect("first run");
    let second = deploy(&cloud, &workspace.config()).expect("second run");

    assert_ne!(first.api_id, second.api_id);
    assert_eq!(cloud.api_ids_named("EventsApi").len(), 2);
    assert!(cloud.route(&first.api_id, "prod", "GET", "/").is_some());
    assert!(cloud.route(&second.api_id, "prod", "GET", "/").is_some());
}

#[test]
fn replace_existing_gateway_leaves_one_api() {
    let workspace = TestWorkspace::new();
    let mut config = workspace.config();
    let cloud = FakeCloud::new();
    deploy(&cloud, &config).expect("first run");

    config.replace_existing_gateway = true;
    let second = deploy(&cloud, &config).expect("second run");

    assert_eq!(cloud.api_ids_named("EventsApi"), vec![second.api_id]);
}

#[test]
fn oversized_artifact_is_staged_through_storage() {
    let workspace = TestWorkspace::new().with_incompressible_source("payload.py", 64 * 1024);
    let mut config = workspace.config();
    config.inline_threshold_bytes = 1024;
    let cloud = FakeCloud::new();

    let report = deploy(&cloud, &config).expect("deploy");

    assert_eq!(report.delivery, DeliveryStrategy::Staged);
    let buckets = cloud.bucket_names();
    assert_eq!(buckets.len(), 1);
    assert!(buckets[0].starts_with("events-api-artifacts-"));
    let staged = cloud
        .object(&buckets[0], "lambda_function.zip")
        .expect("artifact uploaded");
    assert_eq!(cloud.function("EventsApiFunction").expect("function").code, staged);
}

#[test]
fn small_artifact_never_touches_storage() {
    let workspace = TestWorkspace::new();
    let cloud = FakeCloud::new();

    deploy(&cloud, &workspace.config()).expect("deploy");

    assert_eq!(cloud.count_calls("CreateBucket"), 0);
    assert_eq!(cloud.count_calls("PutObject"), 0);
}

#[test]
fn gateway_failure_keeps_artifact_and_earlier_resources() {
    let workspace = TestWorkspace::new();
    let cloud = FakeCloud::new().fail_operation("CreateDeployment");

    let error = deploy(&cloud, &workspace.config()).expect_err("gateway fails");

    assert!(matches!(error, DeployError::Gateway(_)));
    assert!(exists(&workspace.artifact_path()));
    assert_eq!(cloud.function_count(), 1);
    assert_eq!(cloud.count_calls("AddPermission"), 0);
}

#[test]
fn dependency_failure_leaves_previous_function_untouched() {
    let workspace = TestWorkspace::new().with_manifest();
    let config = workspace.config();
    let cloud = FakeCloud::new();
    deploy(&cloud, &config).expect("good deploy");
    let before = cloud.function("EventsApiFunction").expect("function");

    let resolver = FailingResolver::new("No matching distribution found for fastapi==0.104.1");
    let sleeper = RecordingSleeper::default();
    let error = run_deploy(&config, &Services::from_cloud(&cloud, &resolver, &sleeper))
        .expect_err("resolution fails");

    assert!(matches!(error, DeployError::Artifact(_)));
    assert_eq!(cloud.function("EventsApiFunction").expect("function"), before);
    assert_eq!(cloud.count_calls("UpdateFunctionCode"), 0);
    assert_eq!(cloud.count_calls("CreateRestApi"), 1);
}

#[test]
fn table_override_flows_into_policy_and_environment() {
    let workspace = TestWorkspace::new();
    let config = workspace
        .config()
        .with_table_override(Some("StagingEvents".to_string()));
    let cloud = FakeCloud::new();

    deploy(&cloud, &config).expect("deploy");

    assert!(cloud.table("StagingEvents").is_some());
    let role = cloud.role("EventsApiLambdaRole").expect("role");
    let resource = role.inline_policies["DynamoDBAccess"].statement[0]
        .resource
        .clone()
        .expect("resource");
    assert!(resource.ends_with(":table/StagingEvents"));
    assert_eq!(
        cloud
            .function("EventsApiFunction")
            .expect("function")
            .configuration
            .environment
            .get("DYNAMODB_TABLE")
            .map(String::as_str),
        Some("StagingEvents")
    );
}
