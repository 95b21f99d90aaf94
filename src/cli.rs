//! Shared command-line handling for the provisioning binaries.

use anyhow::Context;
use clap::{Args, CommandFactory};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ProvisionConfig;
use crate::error::ProvisionError;
use crate::provision::{provision, ProvisionOptions, ProvisionReport, SchemaKind};

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    /// Name of the database to create
    #[arg(value_name = "DBNAME")]
    pub dbname: Option<String>,

    /// TOML configuration file (defaults to $DIEM_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip objects that already exist instead of failing
    #[arg(long)]
    pub if_not_exists: bool,

    /// Check the resulting tables and extensions against the declared schema
    #[arg(long)]
    pub verify: bool,

    /// Print the provisioning report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProvisionArgs {
    fn options(&self) -> ProvisionOptions {
        ProvisionOptions {
            if_not_exists: self.if_not_exists,
            verify: self.verify,
        }
    }
}

/// Entry point shared by both binaries. `C` supplies the usage text.
pub async fn run<C: CommandFactory>(kind: SchemaKind, args: ProvisionArgs) -> ExitCode {
    let Some(dbname) = args.dbname.clone() else {
        let usage = ProvisionError::UsageError(C::command().render_usage().to_string());
        eprintln!("{}", usage);
        return ExitCode::from(1);
    };

    init_tracing();

    match execute(kind, &dbname, &args).await {
        Ok(report) => match render(&report, args.json) {
            Ok(out) => {
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {:#}", e);
                ExitCode::from(1)
            }
        },
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn execute(kind: SchemaKind, dbname: &str, args: &ProvisionArgs) -> anyhow::Result<ProvisionReport> {
    let config = ProvisionConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    let report = provision(&config, kind, dbname, args.options())
        .await
        .with_context(|| format!("Failed to provision {} schema", kind.as_str()))?;
    Ok(report)
}

fn render(report: &ProvisionReport, json: bool) -> anyhow::Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(report.summary())
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diem_schema=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
