use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{ProvisionError, Result};

pub const DEFAULT_MAINTENANCE_DB: &str = "postgres";
pub const DEFAULT_GEO_EXTENSION: &str = "postgis";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Maintenance connection URL. When unset, `PG*` environment variables apply.
    pub database_url: Option<String>,
    pub maintenance_db: String,
    pub geo_extension: String,
    pub connect_timeout_secs: u64,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            maintenance_db: DEFAULT_MAINTENANCE_DB.to_string(),
            geo_extension: DEFAULT_GEO_EXTENSION.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ProvisionConfig {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(|p| p.to_path_buf())
            .or_else(|| env::var_os("DIEM_CONFIG").map(Into::into));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .map_err(|e| ProvisionError::ConfigError(format!("Failed to read {:?}: {}", path, e)))?;
        toml::from_str(&contents)
            .map_err(|e| ProvisionError::ConfigError(format!("Failed to parse {:?}: {}", path, e)))
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(db) = lookup("DIEM_MAINTENANCE_DB") {
            self.maintenance_db = db;
        }
        if let Some(ext) = lookup("DIEM_GEO_EXTENSION") {
            self.geo_extension = ext;
        }
        if let Some(secs) = lookup("DIEM_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = secs.parse().map_err(|e| {
                ProvisionError::ConfigError(format!("DIEM_CONNECT_TIMEOUT_SECS={}: {}", secs, e))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.geo_extension.trim().is_empty() {
            return Err(ProvisionError::ConfigError(
                "geo_extension must not be empty".to_string(),
            ));
        }
        if self.maintenance_db.is_empty() {
            return Err(ProvisionError::ConfigError(
                "maintenance_db must not be empty".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ProvisionError::ConfigError(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Connection options for the maintenance database used to issue `CREATE DATABASE`.
    pub fn maintenance_options(&self) -> Result<PgConnectOptions> {
        match &self.database_url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| ProvisionError::ConfigError(format!("Invalid DATABASE_URL: {}", e))),
            None => Ok(PgConnectOptions::new().database(&self.maintenance_db)),
        }
    }
}
