//! Provisioning against a live PostgreSQL server
//!
//! Set DIEM_TEST_DATABASE_URL to a superuser maintenance URL to run these.

use diem_schema::database::queries::Queries;
use diem_schema::database::schema::{PROTECTED_ASN, PROTECTED_IP, PROTECTED_LOCATION};
use diem_schema::database::schema::TableSpec;
use diem_schema::provision::{provision, verify, Plan, ProvisionOptions, SchemaKind, StepOutcome};
use diem_schema::ProvisionError;

mod common;
use common::*;

fn strict() -> ProvisionOptions {
    ProvisionOptions::default()
}

async fn assert_columns(pool: &sqlx::PgPool, spec: &TableSpec) {
    let columns = Queries::list_columns(pool, spec.name).await.unwrap();
    let found: Vec<(&str, &str)> = columns
        .iter()
        .map(|c| (c.column_name.as_str(), c.udt_name.as_str()))
        .collect();
    let expected: Vec<(&str, &str)> = spec.columns.iter().map(|c| (c.name, c.udt_name)).collect();
    assert_eq!(found, expected, "columns of {}", spec.name);
}

#[tokio::test]
async fn test_ip_asn_creates_two_tables() {
    let (config, admin) = require_server!();
    let name = unique_name("ipasn");

    let report = provision(
        &config,
        SchemaKind::IpAsn,
        &name,
        ProvisionOptions {
            verify: true,
            ..Default::default()
        },
    )
    .await
    .expect("provisioning failed");

    assert_eq!(report.applied(), 3);
    assert!(report.verified);

    let pool = admin.connect_to(&db_name(&name)).await.unwrap();
    let tables = Queries::list_tables(&pool).await.unwrap();
    assert_eq!(tables, vec!["protected_asn", "protected_ip"]);

    assert_columns(&pool, &PROTECTED_IP).await;
    assert_columns(&pool, &PROTECTED_ASN).await;

    pool.close().await;
    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_location_creates_geometry_table() {
    let (config, admin) = require_server!();
    if !postgis_available(&admin).await {
        eprintln!("skipping: postgis is not available on the test server");
        return;
    }
    let name = unique_name("loc");

    let report = provision(
        &config,
        SchemaKind::Location,
        &name,
        ProvisionOptions {
            verify: true,
            ..Default::default()
        },
    )
    .await
    .expect("provisioning failed");
    assert_eq!(report.applied(), 3);
    assert!(report.verified);

    let pool = admin.connect_to(&db_name(&name)).await.unwrap();
    assert!(Queries::extension_installed(&pool, "postgis").await.unwrap());

    let tables = Queries::list_tables(&pool).await.unwrap();
    assert_eq!(tables, vec![PROTECTED_LOCATION.name]);

    assert_columns(&pool, &PROTECTED_LOCATION).await;

    pool.close().await;
    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_extension_failure_leaves_no_table() {
    let (mut config, admin) = require_server!();
    config.geo_extension = "diem_missing_extension".to_string();
    let name = unique_name("noext");

    let err = provision(&config, SchemaKind::Location, &name, strict())
        .await
        .unwrap_err();
    match &err {
        ProvisionError::StepError { step, database, .. } => {
            assert_eq!(step, "enable extension diem_missing_extension");
            assert_eq!(database, &name);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The database itself is left behind, but holds no table.
    assert!(admin.database_exists(&db_name(&name)).await.unwrap());
    let pool = admin.connect_to(&db_name(&name)).await.unwrap();
    assert!(Queries::list_tables(&pool).await.unwrap().is_empty());

    pool.close().await;
    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_existing_database_is_an_error() {
    let (config, admin) = require_server!();
    let name = unique_name("dup");

    provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .expect("first run failed");

    let err = provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .unwrap_err();
    match &err {
        ProvisionError::StepError { step, .. } => {
            assert_eq!(step, &format!("create database {}", name));
        }
        other => panic!("unexpected error: {other}"),
    }

    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_if_not_exists_rerun_succeeds() {
    let (config, admin) = require_server!();
    let name = unique_name("rerun");

    provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .expect("first run failed");

    let report = provision(
        &config,
        SchemaKind::IpAsn,
        &name,
        ProvisionOptions {
            if_not_exists: true,
            verify: true,
        },
    )
    .await
    .expect("idempotent run failed");

    let create = format!("create database {}", name);
    let outcomes: Vec<(&str, StepOutcome)> = report
        .steps
        .iter()
        .map(|s| (s.step.as_str(), s.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (create.as_str(), StepOutcome::Skipped),
            ("create table protected_ip", StepOutcome::Skipped),
            ("create table protected_asn", StepOutcome::Skipped),
        ]
    );
    assert_eq!(report.applied(), 0);
    assert!(report.verified);

    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_column_types_reject_malformed_values() {
    let (config, admin) = require_server!();
    let name = unique_name("types");

    provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .expect("provisioning failed");
    let pool = admin.connect_to(&db_name(&name)).await.unwrap();

    let insert_asn = |value: &'static str| {
        let pool = pool.clone();
        async move {
            sqlx::query("INSERT INTO protected_asn (organization, asn) VALUES ('RIPE NCC', $1::text::bigint)")
                .bind(value)
                .execute(&pool)
                .await
        }
    };
    assert!(insert_asn("64512").await.is_ok());
    assert!(insert_asn("4200000000").await.is_ok());
    assert!(insert_asn("AS64512").await.is_err());

    let insert_net = |value: &'static str| {
        let pool = pool.clone();
        async move {
            sqlx::query("INSERT INTO protected_ip (organization, net) VALUES ('ICRC', $1::text::cidr)")
                .bind(value)
                .execute(&pool)
                .await
        }
    };
    assert!(insert_net("192.0.2.0/24").await.is_ok());
    assert!(insert_net("2001:db8::/32").await.is_ok());
    assert!(insert_net("192.0.2.1/24").await.is_err());
    assert!(insert_net("not-a-network").await.is_err());

    pool.close().await;
    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_invalid_name_creates_nothing() {
    let (config, _admin) = require_server!();
    let name = "x".repeat(64);

    let err = provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::NameError(_)));
}

#[tokio::test]
async fn test_if_not_exists_creates_only_missing_tables() {
    let (config, admin) = require_server!();
    let name = unique_name("partial");

    provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .expect("first run failed");

    let pool = admin.connect_to(&db_name(&name)).await.unwrap();
    sqlx::raw_sql("DROP TABLE protected_asn").execute(&pool).await.unwrap();
    pool.close().await;

    let report = provision(
        &config,
        SchemaKind::IpAsn,
        &name,
        ProvisionOptions {
            if_not_exists: true,
            verify: true,
        },
    )
    .await
    .expect("idempotent run failed");

    let outcomes: Vec<StepOutcome> = report.steps.iter().map(|s| s.outcome).collect();
    assert_eq!(
        outcomes,
        vec![StepOutcome::Skipped, StepOutcome::Skipped, StepOutcome::Applied]
    );

    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_verify_reports_missing_extension_and_table() {
    let (config, admin) = require_server!();
    let name = unique_name("wrongkind");

    provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .expect("provisioning failed");

    let pool = admin.connect_to(&db_name(&name)).await.unwrap();
    let location_plan = Plan::new(SchemaKind::Location, db_name(&name), "postgis");
    let err = verify::verify(&pool, &location_plan).await.unwrap_err();
    match &err {
        ProvisionError::VerificationError(message) => {
            assert!(message.contains("extension postgis is not installed"), "{}", message);
            assert!(message.contains("table protected_location is missing"), "{}", message);
        }
        other => panic!("unexpected error: {other}"),
    }

    pool.close().await;
    drop_database(&admin, &name).await;
}

#[tokio::test]
async fn test_verify_reports_wrong_column_type() {
    let (config, admin) = require_server!();
    let name = unique_name("drift");

    provision(&config, SchemaKind::IpAsn, &name, strict())
        .await
        .expect("provisioning failed");

    let pool = admin.connect_to(&db_name(&name)).await.unwrap();
    sqlx::raw_sql("ALTER TABLE protected_asn ALTER COLUMN asn TYPE integer")
        .execute(&pool)
        .await
        .unwrap();

    let plan = Plan::new(SchemaKind::IpAsn, db_name(&name), "postgis");
    let err = verify::verify(&pool, &plan).await.unwrap_err();
    assert!(err
        .to_string()
        .contains("column protected_asn.asn has type int4, expected int8"));

    pool.close().await;
    drop_database(&admin, &name).await;
}
