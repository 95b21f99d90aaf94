use diem_schema::config::ProvisionConfig;
use diem_schema::database::{Database, DatabaseName};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maintenance URL of a disposable PostgreSQL server. Live tests are
/// skipped when it is unset.
pub const TEST_URL_VAR: &str = "DIEM_TEST_DATABASE_URL";

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn test_url() -> Option<String> {
    std::env::var(TEST_URL_VAR).ok().filter(|url| !url.is_empty())
}

pub fn test_config() -> Option<ProvisionConfig> {
    test_url().map(|url| ProvisionConfig {
        database_url: Some(url),
        connect_timeout_secs: 5,
        ..Default::default()
    })
}

/// Connect to the maintenance database of the test server
pub async fn setup_admin() -> Option<(ProvisionConfig, Database)> {
    let config = test_config()?;
    let admin = Database::connect(&config)
        .await
        .expect("Failed to connect to test server");
    Some((config, admin))
}

/// A database name no other test run will use
pub fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("diem_test_{}_{}_{}_{}", prefix, std::process::id(), nanos, n)
}

pub fn db_name(name: &str) -> DatabaseName {
    DatabaseName::parse(name).unwrap()
}

pub async fn drop_database(admin: &Database, name: &str) {
    admin
        .drop_database(&db_name(name))
        .await
        .expect("Failed to drop test database");
}

pub async fn postgis_available(admin: &Database) -> bool {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM pg_available_extensions WHERE name = 'postgis')",
    )
    .fetch_one(admin.pool())
    .await
    .unwrap_or(false)
}

/// Yields `(config, admin)` or returns early from the test.
#[macro_export]
macro_rules! require_server {
    () => {
        match common::setup_admin().await {
            Some(found) => found,
            None => {
                eprintln!("skipping: {} not set", common::TEST_URL_VAR);
                return;
            }
        }
    };
}
