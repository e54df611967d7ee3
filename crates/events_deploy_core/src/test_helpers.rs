//! In-memory stand-ins for the remote services, the sleeper and the resolver.
//!
//! `FakeCloud` implements every capability trait against one shared state so a
//! whole deploy can run in a unit test. Failures are injected per operation
//! name (the AWS API name, e.g. `CreateTable`).

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::artifact::DependencyResolver;
use crate::delivery::DeliveryReference;
use crate::error::{ArtifactError, RemoteError, RemoteErrorKind};
use crate::gateway::{GATEWAY_PRINCIPAL, PROXY_PATH_PART};
use crate::policy::{InlinePolicy, PolicyDocument};
use crate::services::{
    AccountLookup, ComputeService, Creation, FunctionConfiguration, FunctionLifecycle,
    FunctionState, GatewayService, IdentityService, InvocationResult, LastUpdate, LogService,
    ObjectStorage, RestApiSummary, TableService, TableStatus,
};
use crate::specs::{FunctionSpec, IntegrationBinding, InvokePermission, RoleSpec, TableSpec};
use crate::wait::Sleeper;

pub const FAKE_ACCOUNT_ID: &str = "123456789012";
pub const FAKE_REGION: &str = "us-west-2";

const SMOKE_RESPONSE: &[u8] =
    br#"{"statusCode": 200, "body": "{\"message\": \"Event Management API\"}"}"#;

fn function_arn(name: &str) -> String {
    format!("arn:aws:lambda:{FAKE_REGION}:{FAKE_ACCOUNT_ID}:function:{name}")
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().expect("poisoned mutex").clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().expect("poisoned mutex").push(duration);
    }
}

/// Writes a fixed set of files into the staging directory.
#[derive(Debug, Default)]
pub struct StaticResolver {
    files: Vec<(String, Vec<u8>)>,
    calls: Cell<usize>,
}

impl StaticResolver {
    pub fn new(files: Vec<(&str, &str)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(path, body)| (path.to_string(), body.as_bytes().to_vec()))
                .collect(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DependencyResolver for StaticResolver {
    fn resolve(&self, _manifest: &Path, staging: &Path) -> Result<(), ArtifactError> {
        self.calls.set(self.calls.get() + 1);
        for (relative, body) in &self.files {
            let target = staging.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|error| ArtifactError::io(parent, error))?;
            }
            fs::write(&target, body).map_err(|error| ArtifactError::io(&target, error))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FailingResolver {
    message: String,
}

impl FailingResolver {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl DependencyResolver for FailingResolver {
    fn resolve(&self, _manifest: &Path, _staging: &Path) -> Result<(), ArtifactError> {
        Err(ArtifactError::DependencyResolution(self.message.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub name: String,
    pub arn: String,
    pub trust_policy: PolicyDocument,
    pub managed_policies: Vec<String>,
    pub inline_policies: BTreeMap<String, PolicyDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub configuration: FunctionConfiguration,
    pub code: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ResourceRecord {
    id: String,
    parent_id: Option<String>,
    path_part: String,
    /// HTTP method to its integration, once one is bound.
    methods: BTreeMap<String, Option<IntegrationBinding>>,
}

#[derive(Debug, Clone)]
struct ApiRecord {
    name: String,
    resources: Vec<ResourceRecord>,
    stages: BTreeSet<String>,
}

impl ApiRecord {
    fn resource_mut(&mut self, id: &str) -> Option<&mut ResourceRecord> {
        self.resources.iter_mut().find(|resource| resource.id == id)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<String>,
    failing: BTreeSet<String>,
    next_id: u32,

    tables: BTreeMap<String, (TableSpec, u32)>,
    table_pending_polls: u32,

    roles: BTreeMap<String, RoleRecord>,
    role_visibility_lag: u32,
    role_lag_remaining: BTreeMap<String, u32>,
    role_assumption_failures: u32,

    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,

    functions: BTreeMap<String, FunctionRecord>,
    function_pending_polls: u32,
    function_pending_remaining: BTreeMap<String, u32>,
    permissions: Vec<InvokePermission>,
    permissions_preexist: bool,
    invocations: Vec<Vec<u8>>,

    apis: BTreeMap<String, ApiRecord>,

    log_streams: BTreeMap<String, Vec<(String, Vec<String>)>>,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    fn resolve_code(
        &self,
        operation: &'static str,
        code: &DeliveryReference,
    ) -> Result<Vec<u8>, RemoteError> {
        match code {
            DeliveryReference::Inline(bytes) => Ok(bytes.clone()),
            DeliveryReference::Staged(location) => self
                .buckets
                .get(&location.bucket)
                .and_then(|objects| objects.get(&location.key))
                .cloned()
                .ok_or_else(|| {
                    RemoteError::not_found(
                        operation,
                        format!("NoSuchKey: s3://{}/{}", location.bucket, location.key),
                    )
                }),
        }
    }

    fn api_mut(
        &mut self,
        operation: &'static str,
        api_id: &str,
    ) -> Result<&mut ApiRecord, RemoteError> {
        self.apis
            .get_mut(api_id)
            .ok_or_else(|| unknown_api(operation, api_id))
    }
}

fn unknown_api(operation: &'static str, api_id: &str) -> RemoteError {
    RemoteError::not_found(operation, format!("Invalid API identifier specified {api_id}"))
}

fn unknown_resource(operation: &'static str, resource_id: &str) -> RemoteError {
    let message = format!("Invalid Resource identifier specified {resource_id}");
    RemoteError::not_found(operation, message)
}

fn unknown_function(operation: &'static str, name: &str) -> RemoteError {
    RemoteError::not_found(operation, format!("Function not found: {name}"))
}

fn apply_configuration(
    configuration: &mut FunctionConfiguration,
    spec: &FunctionSpec,
    role_arn: &str,
) {
    configuration.runtime = spec.runtime.clone();
    configuration.handler = spec.handler.clone();
    configuration.role = role_arn.to_string();
    configuration.memory_mb = spec.memory_mb;
    configuration.timeout_secs = spec.timeout_secs;
    configuration.environment = spec.environment.clone();
}

#[derive(Debug, Default)]
pub struct FakeCloud {
    state: Mutex<FakeState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(mut self, apply: impl FnOnce(&mut FakeState)) -> Self {
        apply(self.state.get_mut().expect("poisoned mutex"));
        self
    }

    /// Every call to `operation` fails with a generic remote error.
    pub fn fail_operation(self, operation: &str) -> Self {
        self.configure(|state| {
            state.failing.insert(operation.to_string());
        })
    }

    /// New tables report `CREATING` for this many status polls.
    pub fn with_table_pending_polls(self, polls: u32) -> Self {
        self.configure(|state| state.table_pending_polls = polls)
    }

    /// New roles are invisible to `GetRole` for this many lookups.
    pub fn with_role_visibility_lag(self, lookups: u32) -> Self {
        self.configure(|state| state.role_visibility_lag = lookups)
    }

    /// The next `count` function creations fail because the role cannot be assumed.
    pub fn with_role_assumption_failures(self, count: u32) -> Self {
        self.configure(|state| state.role_assumption_failures = count)
    }

    /// New functions stay `Pending` for this many state polls.
    pub fn with_function_pending_polls(self, polls: u32) -> Self {
        self.configure(|state| state.function_pending_polls = polls)
    }

    /// Every permission grant reports that the statement already exists.
    pub fn with_existing_permissions(self) -> Self {
        self.configure(|state| state.permissions_preexist = true)
    }

    pub fn with_deployed_function(self, name: &str) -> Self {
        self.configure(|state| {
            state.functions.insert(
                name.to_string(),
                FunctionRecord {
                    configuration: FunctionConfiguration {
                        name: name.to_string(),
                        arn: function_arn(name),
                        runtime: "python3.11".to_string(),
                        handler: "lambda_handler.handler".to_string(),
                        role: format!("arn:aws:iam::{FAKE_ACCOUNT_ID}:role/EventsApiLambdaRole"),
                        memory_mb: 512,
                        timeout_secs: 30,
                        environment: BTreeMap::new(),
                    },
                    code: Vec::new(),
                },
            );
        })
    }

    pub fn push_log_stream(&self, group: &str, stream: &str, events: Vec<String>) {
        self.lock()
            .log_streams
            .entry(group.to_string())
            .or_default()
            .push((stream.to_string(), events));
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("poisoned mutex")
    }

    fn record(&self, operation: &'static str) -> Result<MutexGuard<'_, FakeState>, RemoteError> {
        let mut state = self.lock();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(RemoteError::new(operation, "injected failure"));
        }
        Ok(state)
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|call| *call == operation).count()
    }

    pub fn table_count(&self) -> usize {
        self.lock().tables.len()
    }

    pub fn table(&self, name: &str) -> Option<TableSpec> {
        self.lock().tables.get(name).map(|(spec, _)| spec.clone())
    }

    pub fn role(&self, name: &str) -> Option<RoleRecord> {
        self.lock().roles.get(name).cloned()
    }

    pub fn function(&self, name: &str) -> Option<FunctionRecord> {
        self.lock().functions.get(name).cloned()
    }

    pub fn function_count(&self) -> usize {
        self.lock().functions.len()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.lock().buckets.keys().cloned().collect()
    }

    pub fn api_ids_named(&self, name: &str) -> Vec<String> {
        self.lock()
            .apis
            .iter()
            .filter(|(_, api)| api.name == name)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn permissions(&self) -> Vec<InvokePermission> {
        self.lock().permissions.clone()
    }

    pub fn last_invocation_payload(&self) -> Option<Vec<u8>> {
        self.lock().invocations.last().cloned()
    }

    /// Function ARN a request would reach through the deployed `stage`, if any.
    ///
    /// `/` resolves to the root resource and every other path to the greedy
    /// proxy child. The gateway must also hold an invoke grant for this API.
    pub fn route(&self, api_id: &str, stage: &str, method: &str, path: &str) -> Option<String> {
        let state = self.lock();
        let api = state.apis.get(api_id)?;
        if !api.stages.contains(stage) {
            return None;
        }

        let root = api.resources.iter().find(|r| r.parent_id.is_none())?;
        let resource = if path.is_empty() || path == "/" {
            root
        } else {
            api.resources.iter().find(|r| {
                r.parent_id.as_deref() == Some(root.id.as_str()) && r.path_part == PROXY_PATH_PART
            })?
        };

        let binding = resource
            .methods
            .get(method)
            .or_else(|| resource.methods.get("ANY"))?
            .as_ref()?;
        if binding.integration_type != "AWS_PROXY" {
            return None;
        }
        let function_arn = binding
            .uri
            .split("/functions/")
            .nth(1)?
            .strip_suffix("/invocations")?;

        let api_scope = format!(":{api_id}/");
        let granted = state.permissions.iter().any(|grant| {
            grant.function == function_arn
                && grant.principal == GATEWAY_PRINCIPAL
                && grant.source_arn.contains(&api_scope)
        });
        granted.then(|| function_arn.to_string())
    }
}

impl TableService for FakeCloud {
    fn create_table(&self, spec: &TableSpec) -> Result<Creation<()>, RemoteError> {
        let mut state = self.record("CreateTable")?;
        if state.tables.contains_key(&spec.name) {
            return Ok(Creation::AlreadyExists);
        }
        let pending = state.table_pending_polls;
        state.tables.insert(spec.name.clone(), (spec.clone(), pending));
        Ok(Creation::Created(()))
    }

    fn table_status(&self, name: &str) -> Result<TableStatus, RemoteError> {
        let mut state = self.record("DescribeTable")?;
        let (_, pending) = state.tables.get_mut(name).ok_or_else(|| {
            RemoteError::not_found("DescribeTable", format!("Requested resource not found: {name}"))
        })?;
        if *pending > 0 {
            *pending -= 1;
            Ok(TableStatus::Creating)
        } else {
            Ok(TableStatus::Active)
        }
    }
}

impl IdentityService for FakeCloud {
    fn create_role(&self, spec: &RoleSpec) -> Result<Creation<String>, RemoteError> {
        let mut state = self.record("CreateRole")?;
        if state.roles.contains_key(&spec.name) {
            return Ok(Creation::AlreadyExists);
        }
        let arn = format!("arn:aws:iam::{FAKE_ACCOUNT_ID}:role/{}", spec.name);
        state.roles.insert(
            spec.name.clone(),
            RoleRecord {
                name: spec.name.clone(),
                arn: arn.clone(),
                trust_policy: spec.trust_policy.clone(),
                managed_policies: Vec::new(),
                inline_policies: BTreeMap::new(),
            },
        );
        let lag = state.role_visibility_lag;
        state.role_lag_remaining.insert(spec.name.clone(), lag);
        Ok(Creation::Created(arn))
    }

    fn role_arn(&self, name: &str) -> Result<String, RemoteError> {
        let mut state = self.record("GetRole")?;
        if let Some(remaining) = state.role_lag_remaining.get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::not_found("GetRole", format!("NoSuchEntity: {name}")));
            }
        }
        state
            .roles
            .get(name)
            .map(|role| role.arn.clone())
            .ok_or_else(|| RemoteError::not_found("GetRole", format!("NoSuchEntity: {name}")))
    }

    fn attach_managed_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), RemoteError> {
        let mut state = self.record("AttachRolePolicy")?;
        let role = state.roles.get_mut(role_name).ok_or_else(|| {
            RemoteError::not_found("AttachRolePolicy", format!("NoSuchEntity: {role_name}"))
        })?;
        if !role.managed_policies.iter().any(|arn| arn == policy_arn) {
            role.managed_policies.push(policy_arn.to_string());
        }
        Ok(())
    }

    fn put_inline_policy(&self, role_name: &str, policy: &InlinePolicy) -> Result<(), RemoteError> {
        let mut state = self.record("PutRolePolicy")?;
        let role = state.roles.get_mut(role_name).ok_or_else(|| {
            RemoteError::not_found("PutRolePolicy", format!("NoSuchEntity: {role_name}"))
        })?;
        role.inline_policies
            .insert(policy.name.clone(), policy.document.clone());
        Ok(())
    }
}

impl ObjectStorage for FakeCloud {
    fn create_bucket(&self, name: &str, _region: &str) -> Result<(), RemoteError> {
        let mut state = self.record("CreateBucket")?;
        if state.buckets.contains_key(name) {
            return Err(RemoteError::new("CreateBucket", "BucketAlreadyOwnedByYou"));
        }
        state.buckets.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteError> {
        let mut state = self.record("PutObject")?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| RemoteError::not_found("PutObject", format!("NoSuchBucket: {bucket}")))?;
        objects.insert(key.to_string(), body.to_vec());
        Ok(())
    }
}

impl ComputeService for FakeCloud {
    fn create_function(
        &self,
        spec: &FunctionSpec,
        code: &DeliveryReference,
        role_arn: &str,
    ) -> Result<Creation<String>, RemoteError> {
        let mut state = self.record("CreateFunction")?;
        if state.role_assumption_failures > 0 {
            state.role_assumption_failures -= 1;
            return Err(RemoteError::new(
                "CreateFunction",
                "The role defined for the function cannot be assumed by Lambda.",
            )
            .with_kind(RemoteErrorKind::RoleNotAssumable));
        }
        if state.functions.contains_key(&spec.name) {
            return Ok(Creation::AlreadyExists);
        }

        let code = state.resolve_code("CreateFunction", code)?;
        let arn = function_arn(&spec.name);
        let mut configuration = FunctionConfiguration {
            name: spec.name.clone(),
            arn: arn.clone(),
            ..FunctionConfiguration::default()
        };
        apply_configuration(&mut configuration, spec, role_arn);
        state
            .functions
            .insert(spec.name.clone(), FunctionRecord { configuration, code });
        let pending = state.function_pending_polls;
        state.function_pending_remaining.insert(spec.name.clone(), pending);
        Ok(Creation::Created(arn))
    }

    fn update_function_code(
        &self,
        name: &str,
        code: &DeliveryReference,
    ) -> Result<String, RemoteError> {
        let mut state = self.record("UpdateFunctionCode")?;
        let code = state.resolve_code("UpdateFunctionCode", code)?;
        let function = state
            .functions
            .get_mut(name)
            .ok_or_else(|| unknown_function("UpdateFunctionCode", name))?;
        function.code = code;
        Ok(function.configuration.arn.clone())
    }

    fn update_function_configuration(
        &self,
        spec: &FunctionSpec,
        role_arn: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.record("UpdateFunctionConfiguration")?;
        let function = state
            .functions
            .get_mut(&spec.name)
            .ok_or_else(|| unknown_function("UpdateFunctionConfiguration", &spec.name))?;
        apply_configuration(&mut function.configuration, spec, role_arn);
        Ok(())
    }

    fn function_state(&self, name: &str) -> Result<FunctionState, RemoteError> {
        let mut state = self.record("GetFunctionConfiguration")?;
        if !state.functions.contains_key(name) {
            return Err(unknown_function("GetFunctionConfiguration", name));
        }
        if let Some(remaining) = state.function_pending_remaining.get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(FunctionState {
                    lifecycle: FunctionLifecycle::Pending,
                    last_update: None,
                });
            }
        }
        Ok(FunctionState {
            lifecycle: FunctionLifecycle::Active,
            last_update: Some(LastUpdate::Successful),
        })
    }

    fn function_configuration(&self, name: &str) -> Result<FunctionConfiguration, RemoteError> {
        let state = self.record("GetFunction")?;
        state
            .functions
            .get(name)
            .map(|function| function.configuration.clone())
            .ok_or_else(|| unknown_function("GetFunction", name))
    }

    fn add_permission(&self, grant: &InvokePermission) -> Result<Creation<()>, RemoteError> {
        let mut state = self.record("AddPermission")?;
        let duplicate = state.permissions.iter().any(|existing| {
            existing.function == grant.function && existing.statement_id == grant.statement_id
        });
        if state.permissions_preexist || duplicate {
            return Ok(Creation::AlreadyExists);
        }
        state.permissions.push(grant.clone());
        Ok(Creation::Created(()))
    }

    fn invoke(&self, name: &str, payload: &[u8]) -> Result<InvocationResult, RemoteError> {
        let mut state = self.record("Invoke")?;
        if !state.functions.contains_key(name) {
            return Err(unknown_function("Invoke", name));
        }
        state.invocations.push(payload.to_vec());
        Ok(InvocationResult {
            status_code: 200,
            payload: SMOKE_RESPONSE.to_vec(),
            function_error: None,
        })
    }
}

impl GatewayService for FakeCloud {
    fn create_rest_api(&self, name: &str, _description: &str) -> Result<String, RemoteError> {
        let mut state = self.record("CreateRestApi")?;
        let api_id = state.next_id("api");
        let root_id = state.next_id("res");
        state.apis.insert(
            api_id.clone(),
            ApiRecord {
                name: name.to_string(),
                resources: vec![ResourceRecord {
                    id: root_id,
                    parent_id: None,
                    path_part: String::new(),
                    methods: BTreeMap::new(),
                }],
                stages: BTreeSet::new(),
            },
        );
        Ok(api_id)
    }

    fn root_resource_id(&self, api_id: &str) -> Result<String, RemoteError> {
        let mut state = self.record("GetResources")?;
        let api = state.api_mut("GetResources", api_id)?;
        api.resources
            .iter()
            .find(|resource| resource.parent_id.is_none())
            .map(|resource| resource.id.clone())
            .ok_or_else(|| RemoteError::not_found("GetResources", "root resource missing"))
    }

    fn create_resource(
        &self,
        api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String, RemoteError> {
        let mut state = self.record("CreateResource")?;
        let resource_id = state.next_id("res");
        let api = state.api_mut("CreateResource", api_id)?;
        if api.resource_mut(parent_id).is_none() {
            return Err(unknown_resource("CreateResource", parent_id));
        }
        api.resources.push(ResourceRecord {
            id: resource_id.clone(),
            parent_id: Some(parent_id.to_string()),
            path_part: path_part.to_string(),
            methods: BTreeMap::new(),
        });
        Ok(resource_id)
    }

    fn put_method(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
        _authorization: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.record("PutMethod")?;
        let api = state.api_mut("PutMethod", api_id)?;
        let resource = api
            .resource_mut(resource_id)
            .ok_or_else(|| unknown_resource("PutMethod", resource_id))?;
        resource.methods.insert(http_method.to_string(), None);
        Ok(())
    }

    fn put_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        binding: &IntegrationBinding,
    ) -> Result<(), RemoteError> {
        let mut state = self.record("PutIntegration")?;
        let api = state.api_mut("PutIntegration", api_id)?;
        let resource = api
            .resource_mut(resource_id)
            .ok_or_else(|| unknown_resource("PutIntegration", resource_id))?;
        let slot = resource.methods.get_mut(&binding.http_method).ok_or_else(|| {
            RemoteError::not_found("PutIntegration", "Invalid Method identifier specified")
        })?;
        *slot = Some(binding.clone());
        Ok(())
    }

    fn create_deployment(&self, api_id: &str, stage_name: &str) -> Result<(), RemoteError> {
        let mut state = self.record("CreateDeployment")?;
        let api = state.api_mut("CreateDeployment", api_id)?;
        api.stages.insert(stage_name.to_string());
        Ok(())
    }

    fn list_rest_apis(&self) -> Result<Vec<RestApiSummary>, RemoteError> {
        let state = self.record("GetRestApis")?;
        Ok(state
            .apis
            .iter()
            .map(|(id, api)| RestApiSummary {
                id: id.clone(),
                name: api.name.clone(),
            })
            .collect())
    }

    fn delete_rest_api(&self, api_id: &str) -> Result<(), RemoteError> {
        let mut state = self.record("DeleteRestApi")?;
        state
            .apis
            .remove(api_id)
            .map(|_| ())
            .ok_or_else(|| unknown_api("DeleteRestApi", api_id))
    }
}

impl AccountLookup for FakeCloud {
    fn account_id(&self) -> Result<String, RemoteError> {
        let _state = self.record("GetCallerIdentity")?;
        Ok(FAKE_ACCOUNT_ID.to_string())
    }
}

impl LogService for FakeCloud {
    fn latest_stream(&self, group: &str) -> Result<Option<String>, RemoteError> {
        let state = self.record("DescribeLogStreams")?;
        Ok(state
            .log_streams
            .get(group)
            .and_then(|streams| streams.last())
            .map(|(name, _)| name.clone()))
    }

    fn recent_events(
        &self,
        group: &str,
        stream: &str,
        limit: i32,
    ) -> Result<Vec<String>, RemoteError> {
        let state = self.record("GetLogEvents")?;
        let events = state
            .log_streams
            .get(group)
            .and_then(|streams| streams.iter().find(|(name, _)| name == stream))
            .map(|(_, events)| events.clone())
            .ok_or_else(|| RemoteError::not_found("GetLogEvents", format!("log stream {stream}")))?;
        let limit = usize::try_from(limit).unwrap_or(0);
        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }
}
