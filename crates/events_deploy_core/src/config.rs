//! Deployment constants and the specs derived from them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifact::{BuildPlan, PLATFORM_CODE_CEILING_BYTES};
use crate::delivery::StagingPlan;
use crate::policy::{InlinePolicy, PolicyDocument};
use crate::specs::{FunctionSpec, GatewaySpec, KeyAttribute, RoleSpec, TableSpec};
use crate::wait::Backoff;

pub const TABLE_NAME_ENV: &str = "DYNAMODB_TABLE";
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub region: String,

    pub table_name: String,
    pub partition_key: String,
    pub partition_key_type: String,
    pub billing_mode: String,

    pub role_name: String,
    pub role_description: String,
    pub managed_policy_arns: Vec<String>,
    pub inline_policy_name: String,
    pub propagation_delay: Duration,

    pub function_name: String,
    pub runtime: String,
    pub handler: String,
    pub timeout_secs: i32,
    pub memory_mb: i32,
    /// Extra variables; `DYNAMODB_TABLE` is always derived from `table_name`.
    pub extra_environment: BTreeMap<String, String>,

    pub source_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub source_extension: String,
    pub artifact_path: PathBuf,

    pub inline_threshold_bytes: u64,
    pub staging_bucket_prefix: String,

    pub api_name: String,
    pub api_description: String,
    pub stage_name: String,
    pub statement_id_prefix: String,
    pub replace_existing_gateway: bool,

    pub readiness_backoff: Backoff,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            table_name: "EventsTable".to_string(),
            partition_key: "eventId".to_string(),
            partition_key_type: "S".to_string(),
            billing_mode: "PAY_PER_REQUEST".to_string(),
            role_name: "EventsApiLambdaRole".to_string(),
            role_description: "Execution role for Events API Lambda".to_string(),
            managed_policy_arns: vec![BASIC_EXECUTION_POLICY_ARN.to_string()],
            inline_policy_name: "DynamoDBAccess".to_string(),
            propagation_delay: Duration::from_secs(10),
            function_name: "EventsApiFunction".to_string(),
            runtime: "python3.11".to_string(),
            handler: "lambda_handler.handler".to_string(),
            timeout_secs: 30,
            memory_mb: 512,
            extra_environment: BTreeMap::new(),
            source_dir: PathBuf::from("backend"),
            manifest_path: PathBuf::from("backend/requirements.txt"),
            source_extension: "py".to_string(),
            artifact_path: PathBuf::from("lambda_function.zip"),
            inline_threshold_bytes: PLATFORM_CODE_CEILING_BYTES,
            staging_bucket_prefix: "events-api-artifacts".to_string(),
            api_name: "EventsApi".to_string(),
            api_description: "Events Management API".to_string(),
            stage_name: "prod".to_string(),
            statement_id_prefix: "apigateway-invoke".to_string(),
            replace_existing_gateway: false,
            readiness_backoff: Backoff::default(),
        }
    }
}

impl DeployConfig {
    pub fn with_table_override(mut self, table_name: Option<String>) -> Self {
        if let Some(name) = table_name.filter(|name| !name.trim().is_empty()) {
            self.table_name = name.trim().to_string();
        }
        self
    }

    /// Points the source tree and its manifest at `dir`. The artifact path is
    /// left as it was.
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.manifest_path = dir.join("requirements.txt");
        self.source_dir = dir;
        self
    }

    pub fn table_spec(&self) -> TableSpec {
        TableSpec {
            name: self.table_name.clone(),
            partition_key: KeyAttribute {
                name: self.partition_key.clone(),
                kind: self.partition_key_type.clone(),
            },
            billing_mode: self.billing_mode.clone(),
        }
    }

    pub fn role_spec(&self) -> RoleSpec {
        RoleSpec {
            name: self.role_name.clone(),
            description: self.role_description.clone(),
            trust_policy: PolicyDocument::trust(LAMBDA_SERVICE_PRINCIPAL),
            managed_policy_arns: self.managed_policy_arns.clone(),
            inline_policies: vec![InlinePolicy {
                name: self.inline_policy_name.clone(),
                document: PolicyDocument::table_access(&self.region, &self.table_name),
            }],
            propagation_delay: self.propagation_delay,
        }
    }

    pub fn function_spec(&self) -> FunctionSpec {
        let mut environment = self.extra_environment.clone();
        environment.insert(TABLE_NAME_ENV.to_string(), self.table_name.clone());
        FunctionSpec {
            name: self.function_name.clone(),
            runtime: self.runtime.clone(),
            handler: self.handler.clone(),
            environment,
            timeout_secs: self.timeout_secs,
            memory_mb: self.memory_mb,
        }
    }

    pub fn gateway_spec(&self) -> GatewaySpec {
        GatewaySpec {
            api_name: self.api_name.clone(),
            description: self.api_description.clone(),
            region: self.region.clone(),
            stage_name: self.stage_name.clone(),
            statement_id_prefix: self.statement_id_prefix.clone(),
            replace_existing: self.replace_existing_gateway,
        }
    }

    pub fn build_plan(&self) -> BuildPlan {
        BuildPlan {
            source_dir: self.source_dir.clone(),
            manifest_path: self.manifest_path.clone(),
            source_extension: self.source_extension.clone(),
            output_path: self.artifact_path.clone(),
        }
    }

    pub fn staging_plan(&self) -> StagingPlan {
        StagingPlan {
            region: self.region.clone(),
            bucket_prefix: self.staging_bucket_prefix.clone(),
            inline_threshold_bytes: self.inline_threshold_bytes,
        }
    }
}
