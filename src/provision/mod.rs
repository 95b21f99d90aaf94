//! Schema provisioning
//!
//! Builds a [`Plan`] for a schema kind and applies it to a PostgreSQL server.

pub mod executor;
pub mod plan;
pub mod postgres;
pub mod verify;

pub use executor::{ProvisionReport, Provisioner, StepOutcome, StepRecord, StepRunner};
pub use plan::{Plan, SchemaKind, Step};
pub use postgres::PgStepRunner;

use tracing::info;

use crate::config::ProvisionConfig;
use crate::database::{Database, DatabaseName};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    pub if_not_exists: bool,
    pub verify: bool,
}

/// Create database `name` and the tables for `kind`.
pub async fn provision(
    config: &ProvisionConfig,
    kind: SchemaKind,
    name: &str,
    options: ProvisionOptions,
) -> Result<ProvisionReport> {
    let database = DatabaseName::parse(name)?;
    let plan = Plan::new(kind, database, &config.geo_extension).if_not_exists(options.if_not_exists);

    let admin = Database::connect(config).await?;
    let result = run_plan(&admin, &plan, options).await;
    admin.close().await;
    result
}

async fn run_plan(admin: &Database, plan: &Plan, options: ProvisionOptions) -> Result<ProvisionReport> {
    let mut runner = PgStepRunner::new(admin);
    let result = Provisioner::execute(plan, &mut runner).await;
    runner.close().await;
    let mut report = result?;

    if options.verify {
        let pool = admin.connect_to(&plan.database).await?;
        let verified = verify::verify(&pool, plan).await;
        pool.close().await;
        verified?;
        report.verified = true;
    }

    info!("{}", report.summary());
    Ok(report)
}
