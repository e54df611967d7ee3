use std::collections::HashMap;

use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, LastUpdateStatus, Runtime, State};
use events_deploy_core::delivery::DeliveryReference;
use events_deploy_core::services::{
    ComputeService, Creation, FunctionConfiguration, FunctionLifecycle, FunctionState,
    InvocationResult, LastUpdate,
};
use events_deploy_core::specs::{FunctionSpec, InvokePermission};
use events_deploy_core::RemoteError;

use super::{block_on, error_code, missing, remote_error, AwsCloud};

const CONFLICT: &str = "ResourceConflictException";

fn function_code(code: &DeliveryReference) -> FunctionCode {
    match code {
        DeliveryReference::Inline(bytes) => FunctionCode::builder()
            .zip_file(Blob::new(bytes.clone()))
            .build(),
        DeliveryReference::Staged(location) => FunctionCode::builder()
            .s3_bucket(&location.bucket)
            .s3_key(&location.key)
            .build(),
    }
}

fn environment(spec: &FunctionSpec) -> Environment {
    let variables: HashMap<String, String> = spec
        .environment
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Environment::builder().set_variables(Some(variables)).build()
}

fn lifecycle(state: Option<&State>, reason: Option<&str>) -> FunctionLifecycle {
    match state {
        Some(State::Active) => FunctionLifecycle::Active,
        Some(State::Inactive) => FunctionLifecycle::Inactive,
        Some(State::Failed) => {
            FunctionLifecycle::Failed(reason.unwrap_or("no reason given").to_string())
        }
        _ => FunctionLifecycle::Pending,
    }
}

fn last_update(status: Option<&LastUpdateStatus>, reason: Option<&str>) -> Option<LastUpdate> {
    status.map(|status| match status {
        LastUpdateStatus::Successful => LastUpdate::Successful,
        LastUpdateStatus::Failed => {
            LastUpdate::Failed(reason.unwrap_or("no reason given").to_string())
        }
        _ => LastUpdate::InProgress,
    })
}

impl ComputeService for AwsCloud {
    fn create_function(
        &self,
        spec: &FunctionSpec,
        code: &DeliveryReference,
        role_arn: &str,
    ) -> Result<Creation<String>, RemoteError> {
        const OP: &str = "CreateFunction";
        let result = block_on(
            self.lambda
                .create_function()
                .function_name(&spec.name)
                .runtime(Runtime::from(spec.runtime.as_str()))
                .role(role_arn)
                .handler(&spec.handler)
                .code(function_code(code))
                .timeout(spec.timeout_secs)
                .memory_size(spec.memory_mb)
                .environment(environment(spec))
                .send(),
        );
        match result {
            Ok(output) => output
                .function_arn()
                .map(|arn| Creation::Created(arn.to_string()))
                .ok_or_else(|| missing(OP, "FunctionArn")),
            Err(error) if error_code(&error) == Some(CONFLICT) => Ok(Creation::AlreadyExists),
            Err(error) => Err(remote_error(OP, error)),
        }
    }

    fn update_function_code(
        &self,
        name: &str,
        code: &DeliveryReference,
    ) -> Result<String, RemoteError> {
        const OP: &str = "UpdateFunctionCode";
        let request = self.lambda.update_function_code().function_name(name);
        let request = match code {
            DeliveryReference::Inline(bytes) => request.zip_file(Blob::new(bytes.clone())),
            DeliveryReference::Staged(location) => {
                request.s3_bucket(&location.bucket).s3_key(&location.key)
            }
        };
        let output = block_on(request.send()).map_err(|error| remote_error(OP, error))?;
        output
            .function_arn()
            .map(str::to_string)
            .ok_or_else(|| missing(OP, "FunctionArn"))
    }

    fn update_function_configuration(
        &self,
        spec: &FunctionSpec,
        role_arn: &str,
    ) -> Result<(), RemoteError> {
        block_on(
            self.lambda
                .update_function_configuration()
                .function_name(&spec.name)
                .runtime(Runtime::from(spec.runtime.as_str()))
                .role(role_arn)
                .handler(&spec.handler)
                .timeout(spec.timeout_secs)
                .memory_size(spec.memory_mb)
                .environment(environment(spec))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("UpdateFunctionConfiguration", error))
    }

    fn function_state(&self, name: &str) -> Result<FunctionState, RemoteError> {
        let output = block_on(
            self.lambda
                .get_function_configuration()
                .function_name(name)
                .send(),
        )
        .map_err(|error| remote_error("GetFunctionConfiguration", error))?;
        Ok(FunctionState {
            lifecycle: lifecycle(output.state(), output.state_reason()),
            last_update: last_update(
                output.last_update_status(),
                output.last_update_status_reason(),
            ),
        })
    }

    fn function_configuration(&self, name: &str) -> Result<FunctionConfiguration, RemoteError> {
        const OP: &str = "GetFunction";
        let output = block_on(self.lambda.get_function().function_name(name).send())
            .map_err(|error| remote_error(OP, error))?;
        let configuration = output
            .configuration()
            .ok_or_else(|| missing(OP, "Configuration"))?;
        Ok(FunctionConfiguration {
            name: configuration.function_name().unwrap_or(name).to_string(),
            arn: configuration.function_arn().unwrap_or_default().to_string(),
            runtime: configuration
                .runtime()
                .map(|runtime| runtime.as_str().to_string())
                .unwrap_or_default(),
            handler: configuration.handler().unwrap_or_default().to_string(),
            role: configuration.role().unwrap_or_default().to_string(),
            memory_mb: configuration.memory_size().unwrap_or_default(),
            timeout_secs: configuration.timeout().unwrap_or_default(),
            environment: configuration
                .environment()
                .and_then(|environment| environment.variables())
                .map(|variables| {
                    variables
                        .iter()
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    fn add_permission(&self, grant: &InvokePermission) -> Result<Creation<()>, RemoteError> {
        let result = block_on(
            self.lambda
                .add_permission()
                .function_name(&grant.function)
                .statement_id(&grant.statement_id)
                .action(&grant.action)
                .principal(&grant.principal)
                .source_arn(&grant.source_arn)
                .send(),
        );
        match result {
            Ok(_) => Ok(Creation::Created(())),
            Err(error) if error_code(&error) == Some(CONFLICT) => Ok(Creation::AlreadyExists),
            Err(error) => Err(remote_error("AddPermission", error)),
        }
    }

    fn invoke(&self, name: &str, payload: &[u8]) -> Result<InvocationResult, RemoteError> {
        let output = block_on(
            self.lambda
                .invoke()
                .function_name(name)
                .payload(Blob::new(payload.to_vec()))
                .send(),
        )
        .map_err(|error| remote_error("Invoke", error))?;
        Ok(InvocationResult {
            status_code: output.status_code(),
            payload: output
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
            function_error: output.function_error().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_state_carries_reason() {
        assert_eq!(
            lifecycle(Some(&State::Failed), Some("bad zip")),
            FunctionLifecycle::Failed("bad zip".to_string())
        );
        assert_eq!(lifecycle(None, None), FunctionLifecycle::Pending);
    }

    #[test]
    fn missing_update_status_means_no_update() {
        assert_eq!(last_update(None, None), None);
        assert_eq!(
            last_update(Some(&LastUpdateStatus::InProgress), None),
            Some(LastUpdate::InProgress)
        );
    }
}
