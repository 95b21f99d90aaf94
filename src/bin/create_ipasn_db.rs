//! Creates a database holding protected IP ranges and autonomous systems.

use clap::Parser;
use diem_schema::cli::{run, ProvisionArgs};
use diem_schema::provision::SchemaKind;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "create-ipasn-db")]
#[command(about = "Create a database with the protected_ip and protected_asn tables")]
#[command(version)]
#[command(override_usage = "create-ipasn-db [OPTIONS] <DBNAME>")]
struct Cli {
    #[command(flatten)]
    args: ProvisionArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    run::<Cli>(SchemaKind::IpAsn, cli.args).await
}
