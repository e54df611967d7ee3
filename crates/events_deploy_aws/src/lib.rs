//! AWS SDK adapters for the Events API deployer, plus the CLI pieces shared by
//! the `deploy`, `redeploy`, `inspect` and `smoke_test` binaries.
//!
//! The orchestrator in `events_deploy_core` is synchronous; every adapter call
//! here bridges into the tokio runtime that the binary's `main` runs on.

pub mod adapters;
pub mod cli;
pub mod telemetry;
