//! Capability traits for the remote services a deployment touches.
//!
//! Each provisioner receives only the traits it needs. Calls are blocking;
//! adapters that wrap async SDKs drive them to completion before returning.

use std::collections::BTreeMap;

use crate::delivery::DeliveryReference;
use crate::error::RemoteError;
use crate::policy::InlinePolicy;
use crate::specs::{FunctionSpec, IntegrationBinding, InvokePermission, RoleSpec, TableSpec};

/// Outcome of a create call. Failures travel in the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creation<T> {
    Created(T),
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Other(String),
}

pub trait TableService {
    fn create_table(&self, spec: &TableSpec) -> Result<Creation<()>, RemoteError>;
    fn table_status(&self, name: &str) -> Result<TableStatus, RemoteError>;
}

pub trait IdentityService {
    /// Returns the new role's ARN.
    fn create_role(&self, spec: &RoleSpec) -> Result<Creation<String>, RemoteError>;
    /// Fails with [`crate::RemoteErrorKind::NotFound`] when the role is not visible.
    fn role_arn(&self, name: &str) -> Result<String, RemoteError>;
    fn attach_managed_policy(&self, role_name: &str, policy_arn: &str)
        -> Result<(), RemoteError>;
    fn put_inline_policy(&self, role_name: &str, policy: &InlinePolicy)
        -> Result<(), RemoteError>;
}

pub trait ObjectStorage {
    fn create_bucket(&self, name: &str, region: &str) -> Result<(), RemoteError>;
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionLifecycle {
    Pending,
    Active,
    Inactive,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastUpdate {
    InProgress,
    Successful,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionState {
    pub lifecycle: FunctionLifecycle,
    pub last_update: Option<LastUpdate>,
}

impl FunctionState {
    /// Active and no update still being applied.
    pub fn is_settled(&self) -> bool {
        self.lifecycle == FunctionLifecycle::Active
            && !matches!(self.last_update, Some(LastUpdate::InProgress))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match (&self.lifecycle, &self.last_update) {
            (FunctionLifecycle::Failed(reason), _) => Some(reason),
            (_, Some(LastUpdate::Failed(reason))) => Some(reason),
            _ => None,
        }
    }
}

/// Observed configuration of a deployed function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionConfiguration {
    pub name: String,
    pub arn: String,
    pub runtime: String,
    pub handler: String,
    pub role: String,
    pub memory_mb: i32,
    pub timeout_secs: i32,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub status_code: i32,
    pub payload: Vec<u8>,
    pub function_error: Option<String>,
}

pub trait ComputeService {
    /// Returns the new function's ARN; a name conflict is `AlreadyExists`.
    fn create_function(
        &self,
        spec: &FunctionSpec,
        code: &DeliveryReference,
        role_arn: &str,
    ) -> Result<Creation<String>, RemoteError>;
    /// Returns the function ARN.
    fn update_function_code(
        &self,
        name: &str,
        code: &DeliveryReference,
    ) -> Result<String, RemoteError>;
    fn update_function_configuration(
        &self,
        spec: &FunctionSpec,
        role_arn: &str,
    ) -> Result<(), RemoteError>;
    fn function_state(&self, name: &str) -> Result<FunctionState, RemoteError>;
    fn function_configuration(&self, name: &str) -> Result<FunctionConfiguration, RemoteError>;
    fn add_permission(&self, grant: &InvokePermission) -> Result<Creation<()>, RemoteError>;
    fn invoke(&self, name: &str, payload: &[u8]) -> Result<InvocationResult, RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApiSummary {
    pub id: String,
    pub name: String,
}

pub trait GatewayService {
    /// Returns the new API id.
    fn create_rest_api(&self, name: &str, description: &str) -> Result<String, RemoteError>;
    fn root_resource_id(&self, api_id: &str) -> Result<String, RemoteError>;
    fn create_resource(
        &self,
        api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String, RemoteError>;
    fn put_method(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
        authorization: &str,
    ) -> Result<(), RemoteError>;
    fn put_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        binding: &IntegrationBinding,
    ) -> Result<(), RemoteError>;
    fn create_deployment(&self, api_id: &str, stage_name: &str) -> Result<(), RemoteError>;
    fn list_rest_apis(&self) -> Result<Vec<RestApiSummary>, RemoteError>;
    fn delete_rest_api(&self, api_id: &str) -> Result<(), RemoteError>;
}

pub trait AccountLookup {
    fn account_id(&self) -> Result<String, RemoteError>;
}

pub trait LogService {
    /// Most recently written stream of `group`, if any.
    fn latest_stream(&self, group: &str) -> Result<Option<String>, RemoteError>;
    fn recent_events(
        &self,
        group: &str,
        stream: &str,
        limit: i32,
    ) -> Result<Vec<String>, RemoteError>;
}
