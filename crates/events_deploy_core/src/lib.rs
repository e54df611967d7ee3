//! Deployment orchestration for the Events API.
//!
//! This crate owns the provisioning sequence (table, execution role, artifact,
//! delivery, function, gateway) and the capability traits each stage talks to.
//! It intentionally excludes AWS SDK concerns; `events_deploy_aws` supplies the
//! adapters and binaries.

pub mod artifact;
pub mod config;
pub mod delivery;
pub mod driver;
pub mod error;
pub mod function;
pub mod gateway;
pub mod identity;
pub mod inspect;
pub mod policy;
pub mod services;
pub mod specs;
pub mod table;
pub mod wait;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::DeployConfig;
pub use driver::{run_deploy, DeploymentReport, Services};
pub use error::{ArtifactError, DeployError, DeployResult, RemoteError, RemoteErrorKind};
