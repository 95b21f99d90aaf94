pub mod models;
pub mod queries;
pub mod schema;

use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use queries::Queries;
use schema::quote_ident;

/// PostgreSQL truncates identifiers past `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated database name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(ProvisionError::NameError(
                "name must not be empty".to_string(),
            ));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(ProvisionError::NameError(format!(
                "\"{}\" is {} bytes long (maximum {})",
                name,
                name.len(),
                MAX_IDENTIFIER_LEN
            )));
        }
        if name.contains('\0') {
            return Err(ProvisionError::NameError(
                "name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection to the server's maintenance database.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    options: PgConnectOptions,
    timeout: Duration,
}

impl Database {
    pub async fn connect(config: &ProvisionConfig) -> Result<Self> {
        let options = config.maintenance_options()?;
        let timeout = config.connect_timeout();
        let pool = open_pool(options.clone(), timeout).await?;
        debug!(
            "Connected to maintenance database {:?}",
            options.get_database()
        );
        Ok(Database {
            pool,
            options,
            timeout,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a pool on another database of the same server.
    pub async fn connect_to(&self, name: &DatabaseName) -> Result<PgPool> {
        let options = self.options.clone().database(name.as_str());
        open_pool(options, self.timeout).await
    }

    pub async fn database_exists(&self, name: &DatabaseName) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::database_exists(&mut conn, name.as_str()).await?)
    }

    /// `CREATE DATABASE` cannot run inside a transaction block.
    pub async fn create_database(&self, name: &DatabaseName) -> std::result::Result<(), sqlx::Error> {
        let sql = format!("CREATE DATABASE {}", name.quoted());
        sqlx::raw_sql(&sql).execute(&self.pool).await?;
        info!("Created database {}", name);
        Ok(())
    }

    pub async fn drop_database(&self, name: &DatabaseName) -> std::result::Result<(), sqlx::Error> {
        let sql = format!("DROP DATABASE IF EXISTS {}", name.quoted());
        sqlx::raw_sql(&sql).execute(&self.pool).await?;
        info!("Dropped database {}", name);
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn open_pool(options: PgConnectOptions, timeout: Duration) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
        .map_err(ProvisionError::from)
}
