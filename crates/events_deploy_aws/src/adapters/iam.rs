use events_deploy_core::policy::InlinePolicy;
use events_deploy_core::services::{Creation, IdentityService};
use events_deploy_core::specs::RoleSpec;
use events_deploy_core::RemoteError;

use super::{block_on, error_code, missing, remote_error, AwsCloud};

impl IdentityService for AwsCloud {
    fn create_role(&self, spec: &RoleSpec) -> Result<Creation<String>, RemoteError> {
        const OP: &str = "CreateRole";
        let result = block_on(
            self.iam
                .create_role()
                .role_name(&spec.name)
                .description(&spec.description)
                .assume_role_policy_document(spec.trust_policy.to_json())
                .send(),
        );
        match result {
            Ok(output) => output
                .role()
                .map(|role| Creation::Created(role.arn().to_string()))
                .ok_or_else(|| missing(OP, "Role")),
            Err(error) if error_code(&error) == Some("EntityAlreadyExists") => {
                Ok(Creation::AlreadyExists)
            }
            Err(error) => Err(remote_error(OP, error)),
        }
    }

    fn role_arn(&self, name: &str) -> Result<String, RemoteError> {
        const OP: &str = "GetRole";
        let output = block_on(self.iam.get_role().role_name(name).send())
            .map_err(|error| remote_error(OP, error))?;
        output
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| missing(OP, "Role"))
    }

    fn attach_managed_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), RemoteError> {
        block_on(
            self.iam
                .attach_role_policy()
                .role_name(role_name)
                .policy_arn(policy_arn)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("AttachRolePolicy", error))
    }

    fn put_inline_policy(&self, role_name: &str, policy: &InlinePolicy) -> Result<(), RemoteError> {
        block_on(
            self.iam
                .put_role_policy()
                .role_name(role_name)
                .policy_name(&policy.name)
                .policy_document(policy.document.to_json())
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("PutRolePolicy", error))
    }
}
