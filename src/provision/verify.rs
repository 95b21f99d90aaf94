//! Post-provisioning checks against the system catalog.

use sqlx::PgPool;
use tracing::{info, warn};

use super::plan::Plan;
use crate::database::models::ColumnInfo;
use crate::database::queries::Queries;
use crate::database::schema::TableSpec;
use crate::error::{ProvisionError, Result};

pub async fn verify(pool: &PgPool, plan: &Plan) -> Result<()> {
    let mut problems = Vec::new();

    for ext in plan.extensions() {
        if !Queries::extension_installed(pool, ext).await? {
            problems.push(format!("extension {} is not installed", ext));
        }
    }

    let present = Queries::list_tables(pool).await?;
    for table in plan.tables() {
        if !present.iter().any(|t| t == table.name) {
            problems.push(format!("table {} is missing", table.name));
            continue;
        }
        let columns = Queries::list_columns(pool, table.name).await?;
        problems.extend(compare_columns(table, &columns));
    }

    for extra in present.iter().filter(|t| !plan.tables().any(|s| s.name == t.as_str())) {
        warn!("Database {} has an undeclared table: {}", plan.database, extra);
    }

    if problems.is_empty() {
        info!("Verified schema of database {}", plan.database);
        Ok(())
    } else {
        Err(ProvisionError::VerificationError(problems.join("; ")))
    }
}

/// Differences between a declared table and its catalog columns.
pub fn compare_columns(table: &TableSpec, actual: &[ColumnInfo]) -> Vec<String> {
    let mut problems = Vec::new();

    if actual.len() != table.columns.len() {
        problems.push(format!(
            "table {} has {} columns, expected {}",
            table.name,
            actual.len(),
            table.columns.len()
        ));
    }

    for (expected, found) in table.columns.iter().zip(actual) {
        if expected.name != found.column_name {
            problems.push(format!(
                "table {} column {} is {}, expected {}",
                table.name, found.ordinal_position, found.column_name, expected.name
            ));
        } else if expected.udt_name != found.udt_name {
            problems.push(format!(
                "column {}.{} has type {}, expected {}",
                table.name, expected.name, found.udt_name, expected.udt_name
            ));
        }
    }

    problems
}
