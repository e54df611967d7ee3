//! The deploy sequence: table, role, artifact, delivery, function, gateway.
//!
//! The first fatal error ends the run. Remote resources created before it stay
//! in place; the local artifact is removed only after a successful run.

use tracing::{info, warn};

use crate::artifact::{build_artifact, DependencyResolver};
use crate::config::DeployConfig;
use crate::delivery::{select_delivery, DeliveryStrategy};
use crate::error::DeployResult;
use crate::function::{ensure_function, FunctionOutcome};
use crate::gateway::ensure_gateway;
use crate::identity::ensure_role;
use crate::services::{
    AccountLookup, ComputeService, GatewayService, IdentityService, ObjectStorage, TableService,
};
use crate::table::ensure_table;
use crate::wait::Sleeper;

/// Every capability a deploy run needs, injected by the caller.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub tables: &'a dyn TableService,
    pub identity: &'a dyn IdentityService,
    pub storage: &'a dyn ObjectStorage,
    pub compute: &'a dyn ComputeService,
    pub gateway: &'a dyn GatewayService,
    pub account: &'a dyn AccountLookup,
    pub resolver: &'a dyn DependencyResolver,
    pub sleeper: &'a dyn Sleeper,
}

impl<'a> Services<'a> {
    /// Uses one backend for every remote capability.
    pub fn from_cloud<C>(
        cloud: &'a C,
        resolver: &'a dyn DependencyResolver,
        sleeper: &'a dyn Sleeper,
    ) -> Self
    where
        C: TableService
            + IdentityService
            + ObjectStorage
            + ComputeService
            + GatewayService
            + AccountLookup,
    {
        Self {
            tables: cloud,
            identity: cloud,
            storage: cloud,
            compute: cloud,
            gateway: cloud,
            account: cloud,
            resolver,
            sleeper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub table_name: String,
    pub role_arn: String,
    pub artifact_size_bytes: u64,
    pub delivery: DeliveryStrategy,
    pub function_arn: String,
    pub function_outcome: FunctionOutcome,
    pub api_id: String,
    pub invocation_url: String,
}

pub fn run_deploy(
    config: &DeployConfig,
    services: &Services<'_>,
) -> DeployResult<DeploymentReport> {
    let backoff = &config.readiness_backoff;

    step(1, "table");
    let table = ensure_table(services.tables, services.sleeper, backoff, &config.table_spec())?;

    step(2, "execution role");
    let role = ensure_role(services.identity, services.sleeper, backoff, &config.role_spec())?;

    step(3, "artifact");
    let artifact = build_artifact(&config.build_plan(), services.resolver)?;

    step(4, "artifact delivery");
    let delivery = select_delivery(services.storage, &config.staging_plan(), &artifact)?;

    step(5, "function");
    let function = ensure_function(
        services.compute,
        services.sleeper,
        backoff,
        &config.function_spec(),
        &delivery,
        &role.arn,
    )?;

    step(6, "gateway");
    let gateway = ensure_gateway(
        services.gateway,
        services.compute,
        services.account,
        services.sleeper,
        &config.gateway_spec(),
        &function.arn,
    )?;

    if let Err(error) = artifact.remove() {
        warn!(%error, "could not remove local artifact");
    }

    info!(url = %gateway.invocation_url, "deployment complete");
    Ok(DeploymentReport {
        table_name: table.name,
        role_arn: role.arn,
        artifact_size_bytes: artifact.size_bytes,
        delivery: delivery.strategy(),
        function_arn: function.arn,
        function_outcome: function.outcome,
        api_id: gateway.api_id,
        invocation_url: gateway.invocation_url,
    })
}

fn step(number: u8, label: &str) {
    info!("=== [{number}/6] {label} ===");
}
