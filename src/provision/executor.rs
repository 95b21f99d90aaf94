//! Plan execution
//!
//! Steps run strictly in order. The first failing step halts the run and no
//! later step is attempted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use super::plan::{Plan, SchemaKind, Step};
use crate::database::DatabaseName;
use crate::error::{ProvisionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    /// The object already existed and `if_not_exists` was set.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: String,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub database: DatabaseName,
    pub kind: SchemaKind,
    pub steps: Vec<StepRecord>,
    pub verified: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProvisionReport {
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.steps.len() - self.applied()
    }

    pub fn summary(&self) -> String {
        format!(
            "Provisioned {} schema in database \"{}\" ({} applied, {} skipped{})",
            self.kind.as_str(),
            self.database,
            self.applied(),
            self.skipped(),
            if self.verified { ", verified" } else { "" }
        )
    }
}

/// Applies plan steps to a database server.
#[allow(async_fn_in_trait)]
pub trait StepRunner {
    async fn run(&mut self, step: &Step, if_not_exists: bool) -> Result<StepOutcome>;

    /// Called once after every step succeeded.
    async fn finish(&mut self) -> Result<()>;
}

pub struct Provisioner;

impl Provisioner {
    pub async fn execute<R: StepRunner>(plan: &Plan, runner: &mut R) -> Result<ProvisionReport> {
        let started_at = Utc::now();
        info!(
            "Provisioning {} schema in database {} ({} steps)",
            plan.kind.as_str(),
            plan.database,
            plan.steps.len()
        );

        let mut steps = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            debug!("Running step: {}", step);
            let outcome = runner
                .run(step, plan.if_not_exists)
                .await
                .map_err(|e| Self::step_error(step.to_string(), plan, e))?;

            match outcome {
                StepOutcome::Applied => info!("Applied: {}", step),
                StepOutcome::Skipped => info!("Skipped (already present): {}", step),
            }
            steps.push(StepRecord {
                step: step.to_string(),
                outcome,
            });
        }

        runner
            .finish()
            .await
            .map_err(|e| Self::step_error("commit".to_string(), plan, e))?;

        Ok(ProvisionReport {
            database: plan.database.clone(),
            kind: plan.kind,
            steps,
            verified: false,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn step_error(step: String, plan: &Plan, err: ProvisionError) -> ProvisionError {
        let err = match err {
            ProvisionError::StepError { .. } => err,
            other => ProvisionError::step_failed(step, plan.database.as_str(), other),
        };
        error!("{}", err);
        err
    }
}
