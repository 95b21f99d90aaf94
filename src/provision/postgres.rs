use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use super::executor::{StepOutcome, StepRunner};
use super::plan::Step;
use crate::database::queries::Queries;
use crate::database::{Database, DatabaseName};
use crate::error::{ProvisionError, Result};

/// Runs plan steps against a live server.
///
/// The database is created over the maintenance connection. Every later step
/// runs in a single transaction on the new database, committed by `finish`.
pub struct PgStepRunner<'a> {
    admin: &'a Database,
    target: Option<PgPool>,
    tx: Option<Transaction<'static, Postgres>>,
}

impl<'a> PgStepRunner<'a> {
    pub fn new(admin: &'a Database) -> Self {
        Self {
            admin,
            target: None,
            tx: None,
        }
    }

    async fn open(&mut self, name: &DatabaseName) -> Result<()> {
        let pool = self.admin.connect_to(name).await?;
        let tx = pool.begin().await?;
        debug!("Opened schema transaction on {}", name);
        self.target = Some(pool);
        self.tx = Some(tx);
        Ok(())
    }

    /// Roll back anything uncommitted and release the target connection.
    pub async fn close(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                warn!("Rollback failed: {}", e);
            }
        }
        if let Some(pool) = self.target.take() {
            pool.close().await;
        }
    }
}

impl StepRunner for PgStepRunner<'_> {
    async fn run(&mut self, step: &Step, if_not_exists: bool) -> Result<StepOutcome> {
        match step {
            Step::CreateDatabase(name) => {
                let outcome = if if_not_exists && self.admin.database_exists(name).await? {
                    warn!("Database {} already exists", name);
                    StepOutcome::Skipped
                } else {
                    self.admin.create_database(name).await?;
                    StepOutcome::Applied
                };
                self.open(name)
                    .await
                    .map_err(|e| open_failed(name, outcome, e))?;
                Ok(outcome)
            }
            Step::EnableExtension(_) | Step::CreateTable(_) => {
                let tx = self.tx.as_mut().ok_or_else(|| {
                    ProvisionError::DatabaseError(format!("no target database open for step '{}'", step))
                })?;
                if if_not_exists {
                    let present = match step {
                        Step::EnableExtension(ext) => Queries::extension_exists(&mut **tx, ext).await?,
                        Step::CreateTable(table) => Queries::table_exists(&mut **tx, table.name).await?,
                        Step::CreateDatabase(_) => false,
                    };
                    if present {
                        return Ok(StepOutcome::Skipped);
                    }
                }
                let sql = step.sql(if_not_exists);
                debug!("Executing: {}", sql);
                sqlx::raw_sql(&sql).execute(&mut **tx).await?;
                Ok(StepOutcome::Applied)
            }
        }
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        if let Some(pool) = self.target.take() {
            pool.close().await;
        }
        Ok(())
    }
}

/// A failure to open the database after the create step. The database may
/// already exist on the server at this point.
fn open_failed(name: &DatabaseName, outcome: StepOutcome, err: ProvisionError) -> ProvisionError {
    let message = match outcome {
        StepOutcome::Applied => format!("database was created but could not be opened: {}", err),
        StepOutcome::Skipped => format!("existing database could not be opened: {}", err),
    };
    ProvisionError::StepError {
        step: format!("open database {}", name),
        database: name.to_string(),
        message,
    }
}
