use events_deploy_core::services::AccountLookup;
use events_deploy_core::RemoteError;

use super::{block_on, missing, remote_error, AwsCloud};

impl AccountLookup for AwsCloud {
    fn account_id(&self) -> Result<String, RemoteError> {
        const OP: &str = "GetCallerIdentity";
        let output = block_on(self.sts.get_caller_identity().send())
            .map_err(|error| remote_error(OP, error))?;
        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| missing(OP, "Account"))
    }
}
