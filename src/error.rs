use thiserror::Error;

impl From<sqlx::Error> for ProvisionError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{0}")]
    UsageError(String),

    #[error("Invalid database name: {0}")]
    NameError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Step '{step}' failed on database \"{database}\": {message}")]
    StepError {
        step: String,
        database: String,
        message: String,
    },

    #[error("Schema verification failed: {0}")]
    VerificationError(String),
}

impl ProvisionError {
    pub fn step_failed(step: impl Into<String>, database: &str, err: impl std::fmt::Display) -> Self {
        Self::StepError {
            step: step.into(),
            database: database.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
