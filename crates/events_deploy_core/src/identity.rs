use tracing::info;

use crate::error::{DeployError, DeployResult, RemoteErrorKind};
use crate::services::{Creation, IdentityService};
use crate::specs::RoleSpec;
use crate::wait::{poll_until, Backoff, Poll, Sleeper, WaitError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    pub name: String,
    pub arn: String,
    pub created: bool,
}

/// Creates the execution role, or returns the ARN of the existing one.
///
/// Policies are attached only on creation. A new role is polled until it is
/// visible, then held back for `spec.propagation_delay`, because trust
/// propagation to the compute platform has no observable signal.
pub fn ensure_role(
    identity: &dyn IdentityService,
    sleeper: &dyn Sleeper,
    backoff: &Backoff,
    spec: &RoleSpec,
) -> DeployResult<RoleHandle> {
    info!(role = %spec.name, "ensuring execution role");
    let arn = match identity.create_role(spec).map_err(DeployError::Role)? {
        Creation::Created(arn) => arn,
        Creation::AlreadyExists => {
            let arn = identity.role_arn(&spec.name).map_err(DeployError::Role)?;
            info!(role = %spec.name, %arn, "role already exists");
            return Ok(RoleHandle {
                name: spec.name.clone(),
                arn,
                created: false,
            });
        }
    };
    info!(role = %spec.name, %arn, "role created");

    for policy_arn in &spec.managed_policy_arns {
        identity
            .attach_managed_policy(&spec.name, policy_arn)
            .map_err(DeployError::Role)?;
        info!(role = %spec.name, policy = %policy_arn, "managed policy attached");
    }
    for policy in &spec.inline_policies {
        identity
            .put_inline_policy(&spec.name, policy)
            .map_err(DeployError::Role)?;
        info!(role = %spec.name, policy = %policy.name, "inline policy attached");
    }

    poll_until(backoff, sleeper, &spec.name, || {
        match identity.role_arn(&spec.name) {
            Ok(_) => Ok(Poll::Ready(())),
            Err(error) if error.is(RemoteErrorKind::NotFound) => Ok(Poll::Pending),
            Err(error) => Err(error),
        }
    })
    .map_err(|error| match error {
        WaitError::Failed(source) => DeployError::Role(source),
        WaitError::Exhausted { attempts } => DeployError::NotReady {
            resource: format!("role {}", spec.name),
            attempts,
        },
    })?;

    info!(delay = ?spec.propagation_delay, "waiting for role to propagate");
    sleeper.sleep(spec.propagation_delay);

    Ok(RoleHandle {
        name: spec.name.clone(),
        arn,
        created: true,
    })
}
