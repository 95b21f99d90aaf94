pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod provision;

pub use error::ProvisionError;
