//! Chooses how the artifact reaches the compute platform.
//!
//! Artifacts up to the inline threshold travel inside the function call.
//! Larger ones are uploaded to a fresh bucket first and referenced by location.
//! Staged buckets are left in place after the run.

use chrono::Utc;
use tracing::info;

use crate::artifact::Artifact;
use crate::error::{DeployError, DeployResult};
use crate::services::ObjectStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStrategy {
    Inline,
    Staged,
}

impl DeliveryStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Staged => "staged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedLocation {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReference {
    Inline(Vec<u8>),
    Staged(StagedLocation),
}

impl DeliveryReference {
    pub fn strategy(&self) -> DeliveryStrategy {
        match self {
            Self::Inline(_) => DeliveryStrategy::Inline,
            Self::Staged(_) => DeliveryStrategy::Staged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    pub region: String,
    pub bucket_prefix: String,
    /// Largest size, inclusive, still sent inline.
    pub inline_threshold_bytes: u64,
}

pub fn choose_strategy(size_bytes: u64, inline_threshold_bytes: u64) -> DeliveryStrategy {
    if size_bytes <= inline_threshold_bytes {
        DeliveryStrategy::Inline
    } else {
        DeliveryStrategy::Staged
    }
}

/// `{prefix}-{unix seconds}-{first 8 fingerprint chars}`, lowercase as S3 requires.
pub fn staging_bucket_name(prefix: &str, unix_secs: i64, fingerprint: &str) -> String {
    let short: String = fingerprint.chars().take(8).collect();
    format!("{prefix}-{unix_secs}-{short}").to_ascii_lowercase()
}

pub fn select_delivery(
    storage: &dyn ObjectStorage,
    plan: &StagingPlan,
    artifact: &Artifact,
) -> DeployResult<DeliveryReference> {
    let strategy = choose_strategy(artifact.size_bytes, plan.inline_threshold_bytes);
    info!(
        size_bytes = artifact.size_bytes,
        threshold_bytes = plan.inline_threshold_bytes,
        strategy = strategy.as_str(),
        "selected artifact delivery"
    );

    match strategy {
        DeliveryStrategy::Inline => Ok(DeliveryReference::Inline(artifact.bytes.clone())),
        DeliveryStrategy::Staged => {
            let location = StagedLocation {
                bucket: staging_bucket_name(
                    &plan.bucket_prefix,
                    Utc::now().timestamp(),
                    &artifact.fingerprint,
                ),
                key: artifact.file_name(),
            };
            storage
                .create_bucket(&location.bucket, &plan.region)
                .map_err(DeployError::Delivery)?;
            info!(bucket = %location.bucket, "staging bucket created");
            storage
                .put_object(&location.bucket, &location.key, &artifact.bytes)
                .map_err(DeployError::Delivery)?;
            info!(bucket = %location.bucket, key = %location.key, "artifact uploaded");
            Ok(DeliveryReference::Staged(location))
        }
    }
}
