//! One `AwsCloud` value implements every capability trait of the core crate.
//! Each service's impl lives in its own module.

pub mod apigateway;
pub mod dynamodb;
pub mod iam;
pub mod lambda;
pub mod logs;
pub mod s3;
pub mod sts;

use std::future::Future;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata};
use events_deploy_core::{RemoteError, RemoteErrorKind};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AwsCloud {
    pub(crate) dynamodb: aws_sdk_dynamodb::Client,
    pub(crate) iam: aws_sdk_iam::Client,
    pub(crate) lambda: aws_sdk_lambda::Client,
    pub(crate) s3: aws_sdk_s3::Client,
    pub(crate) apigateway: aws_sdk_apigateway::Client,
    pub(crate) sts: aws_sdk_sts::Client,
    pub(crate) logs: aws_sdk_cloudwatchlogs::Client,
}

impl AwsCloud {
    /// Loads credentials from the default provider chain, pinned to `region`.
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::from_config(&config)
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            dynamodb: aws_sdk_dynamodb::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            lambda: aws_sdk_lambda::Client::new(config),
            s3: aws_sdk_s3::Client::new(config),
            apigateway: aws_sdk_apigateway::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
            logs: aws_sdk_cloudwatchlogs::Client::new(config),
        }
    }
}

/// Runs an SDK future to completion from synchronous code.
///
/// Must be called from inside a multi-thread tokio runtime.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub(crate) fn error_code<E: ProvideErrorMetadata>(error: &E) -> Option<&str> {
    error.code()
}

/// Maps a service error code (and message) onto the kinds the orchestrator
/// branches on.
pub(crate) fn classify(code: Option<&str>, message: Option<&str>) -> RemoteErrorKind {
    match code {
        Some(
            "ResourceNotFoundException"
            | "NoSuchEntity"
            | "NotFoundException"
            | "NoSuchBucket"
            | "NoSuchKey",
        ) => RemoteErrorKind::NotFound,
        Some("InvalidParameterValueException")
            if message.is_some_and(|m| m.contains("cannot be assumed")) =>
        {
            RemoteErrorKind::RoleNotAssumable
        }
        _ => RemoteErrorKind::Other,
    }
}

pub(crate) fn remote_error<E>(operation: &'static str, error: E) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let kind = classify(error.code(), error.message());
    debug!(operation, code = ?error.code(), ?kind, "remote call failed");
    RemoteError::new(operation, DisplayErrorContext(&error).to_string()).with_kind(kind)
}

/// For response fields the service always sets but the SDK models as optional.
pub(crate) fn missing(operation: &'static str, field: &str) -> RemoteError {
    RemoteError::new(operation, format!("response did not include {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn block_on_drives_futures_from_sync_code() {
        let value = block_on(async { 21 * 2 });
        assert_eq!(value, 42);
    }

    #[test]
    fn not_found_codes_across_services() {
        for code in ["ResourceNotFoundException", "NoSuchEntity", "NotFoundException"] {
            assert_eq!(classify(Some(code), None), RemoteErrorKind::NotFound, "{code}");
        }
    }

    #[test]
    fn role_assumption_needs_matching_message() {
        assert_eq!(
            classify(
                Some("InvalidParameterValueException"),
                Some("The role defined for the function cannot be assumed by Lambda."),
            ),
            RemoteErrorKind::RoleNotAssumable
        );
        assert_eq!(
            classify(
                Some("InvalidParameterValueException"),
                Some("Unzipped size must be smaller than 262144000 bytes"),
            ),
            RemoteErrorKind::Other
        );
    }

    #[test]
    fn unknown_or_missing_codes_are_other() {
        assert_eq!(classify(Some("ThrottlingException"), None), RemoteErrorKind::Other);
        assert_eq!(classify(None, None), RemoteErrorKind::Other);
    }
}
