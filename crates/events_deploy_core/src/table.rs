use tracing::info;

use crate::error::{DeployError, DeployResult};
use crate::services::{Creation, TableService, TableStatus};
use crate::specs::TableSpec;
use crate::wait::{poll_until, Backoff, Poll, Sleeper, WaitError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
    pub created: bool,
}

/// Creates the table unless it already exists, then blocks until it is `ACTIVE`.
pub fn ensure_table(
    tables: &dyn TableService,
    sleeper: &dyn Sleeper,
    backoff: &Backoff,
    spec: &TableSpec,
) -> DeployResult<TableHandle> {
    info!(table = %spec.name, "ensuring table");
    let created = match tables.create_table(spec).map_err(DeployError::Table)? {
        Creation::Created(()) => {
            info!(table = %spec.name, "table created");
            true
        }
        Creation::AlreadyExists => {
            info!(table = %spec.name, "table already exists");
            false
        }
    };

    poll_until(backoff, sleeper, &spec.name, || {
        match tables.table_status(&spec.name)? {
            TableStatus::Active => Ok(Poll::Ready(())),
            _ => Ok(Poll::Pending),
        }
    })
    .map_err(|error| match error {
        WaitError::Failed(source) => DeployError::Table(source),
        WaitError::Exhausted { attempts } => DeployError::NotReady {
            resource: format!("table {}", spec.name),
            attempts,
        },
    })?;
    info!(table = %spec.name, "table is active");

    Ok(TableHandle {
        name: spec.name.clone(),
        created,
    })
}
