use tracing::{info, warn};

use crate::delivery::DeliveryReference;
use crate::error::{DeployError, DeployResult, RemoteError, RemoteErrorKind};
use crate::services::{ComputeService, Creation};
use crate::specs::FunctionSpec;
use crate::wait::{poll_until, Backoff, Poll, Sleeper, WaitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHandle {
    pub name: String,
    pub arn: String,
    pub outcome: FunctionOutcome,
}

/// Creates the function, or converges an existing one by pushing code and
/// then configuration.
///
/// Creation is retried while the platform still refuses to assume the role.
/// If the configuration push fails after new code landed, the function is
/// left half-updated and [`DeployError::InconsistentUpdate`] is returned.
pub fn ensure_function(
    compute: &dyn ComputeService,
    sleeper: &dyn Sleeper,
    backoff: &Backoff,
    spec: &FunctionSpec,
    code: &DeliveryReference,
    role_arn: &str,
) -> DeployResult<FunctionHandle> {
    info!(
        function = %spec.name,
        delivery = code.strategy().as_str(),
        "ensuring function"
    );

    let creation = poll_until(backoff, sleeper, &spec.name, || {
        match compute.create_function(spec, code, role_arn) {
            Ok(creation) => Ok(Poll::Ready(creation)),
            Err(error) if error.is(RemoteErrorKind::RoleNotAssumable) => {
                warn!(function = %spec.name, "execution role not assumable yet, retrying");
                Ok(Poll::Pending)
            }
            Err(error) => Err(error),
        }
    })
    .map_err(|error| stage_error(&spec.name, error, DeployError::Function))?;

    match creation {
        Creation::Created(arn) => {
            info!(function = %spec.name, %arn, "function created");
            wait_until_settled(compute, sleeper, backoff, &spec.name)
                .map_err(|error| stage_error(&spec.name, error, DeployError::Function))?;
            Ok(FunctionHandle {
                name: spec.name.clone(),
                arn,
                outcome: FunctionOutcome::Created,
            })
        }
        Creation::AlreadyExists => {
            info!(function = %spec.name, "function already exists, updating code");
            let arn = compute
                .update_function_code(&spec.name, code)
                .map_err(DeployError::Function)?;

            let half_updated = |source: RemoteError| DeployError::InconsistentUpdate {
                function: spec.name.clone(),
                source,
            };
            wait_until_settled(compute, sleeper, backoff, &spec.name)
                .map_err(|error| stage_error(&spec.name, error, half_updated))?;

            info!(function = %spec.name, "updating configuration");
            compute
                .update_function_configuration(spec, role_arn)
                .map_err(half_updated)?;
            wait_until_settled(compute, sleeper, backoff, &spec.name)
                .map_err(|error| stage_error(&spec.name, error, DeployError::Function))?;

            info!(function = %spec.name, %arn, "function updated");
            Ok(FunctionHandle {
                name: spec.name.clone(),
                arn,
                outcome: FunctionOutcome::Updated,
            })
        }
    }
}

fn wait_until_settled(
    compute: &dyn ComputeService,
    sleeper: &dyn Sleeper,
    backoff: &Backoff,
    name: &str,
) -> Result<(), WaitError<RemoteError>> {
    poll_until(backoff, sleeper, name, || {
        let state = compute.function_state(name)?;
        if let Some(reason) = state.failure_reason() {
            return Err(RemoteError::new(
                "GetFunctionConfiguration",
                format!("function {name} failed: {reason}"),
            ));
        }
        Ok(if state.is_settled() {
            Poll::Ready(())
        } else {
            Poll::Pending
        })
    })
}

fn stage_error(
    name: &str,
    error: WaitError<RemoteError>,
    wrap: impl FnOnce(RemoteError) -> DeployError,
) -> DeployError {
    match error {
        WaitError::Failed(source) => wrap(source),
        WaitError::Exhausted { attempts } => DeployError::NotReady {
            resource: format!("function {name}"),
            attempts,
        },
    }
}
