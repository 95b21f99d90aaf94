//! Creates a geospatial database holding protected areas.

use clap::Parser;
use diem_schema::cli::{run, ProvisionArgs};
use diem_schema::provision::SchemaKind;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "create-location-db")]
#[command(about = "Create a database with the geospatial extension and the protected_location table")]
#[command(version)]
#[command(override_usage = "create-location-db [OPTIONS] <DBNAME>")]
struct Cli {
    #[command(flatten)]
    args: ProvisionArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    run::<Cli>(SchemaKind::Location, cli.args).await
}
