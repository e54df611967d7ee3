//! Desired-state descriptors handed to the provisioners.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::policy::{InlinePolicy, PolicyDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    /// Scalar attribute type code: `S`, `N` or `B`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub billing_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
    pub description: String,
    pub trust_policy: PolicyDocument,
    pub managed_policy_arns: Vec<String>,
    pub inline_policies: Vec<InlinePolicy>,
    /// Fixed wait after creation; trust propagation exposes no readiness signal.
    pub propagation_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub runtime: String,
    pub handler: String,
    pub environment: BTreeMap<String, String>,
    pub timeout_secs: i32,
    pub memory_mb: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySpec {
    pub api_name: String,
    pub description: String,
    pub region: String,
    pub stage_name: String,
    pub statement_id_prefix: String,
    /// Delete same-named APIs before creating a new one.
    pub replace_existing: bool,
}

impl GatewaySpec {
    pub fn invocation_url(&self, api_id: &str) -> String {
        format!(
            "https://{api_id}.execute-api.{}.amazonaws.com/{}",
            self.region, self.stage_name
        )
    }

    pub fn source_arn(&self, account_id: &str, api_id: &str) -> String {
        format!("arn:aws:execute-api:{}:{account_id}:{api_id}/*/*", self.region)
    }

    pub fn integration_uri(&self, function_arn: &str) -> String {
        format!(
            "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{function_arn}/invocations",
            self.region
        )
    }
}

/// Method plus integration bound on a single gateway resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationBinding {
    pub http_method: String,
    pub authorization: String,
    pub integration_type: String,
    pub integration_http_method: String,
    pub uri: String,
}

impl IntegrationBinding {
    /// `ANY` verb, no authorization, Lambda proxy pass-through.
    pub fn lambda_proxy(uri: String) -> Self {
        Self {
            http_method: "ANY".to_string(),
            authorization: "NONE".to_string(),
            integration_type: "AWS_PROXY".to_string(),
            integration_http_method: "POST".to_string(),
            uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokePermission {
    pub function: String,
    pub statement_id: String,
    pub action: String,
    pub principal: String,
    pub source_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> GatewaySpec {
        GatewaySpec {
            api_name: "EventsApi".to_string(),
            description: "Events Management API".to_string(),
            region: "us-west-2".to_string(),
            stage_name: "prod".to_string(),
            statement_id_prefix: "apigateway-invoke".to_string(),
            replace_existing: false,
        }
    }

    #[test]
    fn invocation_url_is_deterministic() {
        assert_eq!(
            gateway().invocation_url("abc123"),
            "https://abc123.execute-api.us-west-2.amazonaws.com/prod"
        );
    }

    #[test]
    fn source_arn_covers_every_stage_and_route() {
        assert_eq!(
            gateway().source_arn("123456789012", "abc123"),
            "arn:aws:execute-api:us-west-2:123456789012:abc123/*/*"
        );
    }

    #[test]
    fn integration_uri_wraps_function_arn() {
        let uri = gateway()
            .integration_uri("arn:aws:lambda:us-west-2:123456789012:function:EventsApiFunction");
        assert_eq!(
            uri,
            "arn:aws:apigateway:us-west-2:lambda:path/2015-03-31/functions/arn:aws:lambda:us-west-2:123456789012:function:EventsApiFunction/invocations"
        );
    }
}
