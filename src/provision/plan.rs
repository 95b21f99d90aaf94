//! Provisioning plans
//!
//! A plan is the ordered list of steps that builds one schema kind.

use serde::Serialize;
use std::fmt;

use crate::database::schema::{quote_ident, TableSpec, PROTECTED_ASN, PROTECTED_IP, PROTECTED_LOCATION};
use crate::database::DatabaseName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Protected IP ranges and autonomous systems.
    IpAsn,
    /// Protected geographic areas.
    Location,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::IpAsn => "ip_asn",
            SchemaKind::Location => "location",
        }
    }

    pub fn tables(&self) -> &'static [TableSpec] {
        match self {
            SchemaKind::IpAsn => &[PROTECTED_IP, PROTECTED_ASN],
            SchemaKind::Location => &[PROTECTED_LOCATION],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateDatabase(DatabaseName),
    EnableExtension(String),
    CreateTable(TableSpec),
}

impl Step {
    pub fn sql(&self, if_not_exists: bool) -> String {
        match self {
            Step::CreateDatabase(name) => format!("CREATE DATABASE {}", name.quoted()),
            Step::EnableExtension(ext) => format!(
                "CREATE EXTENSION {}{}",
                if if_not_exists { "IF NOT EXISTS " } else { "" },
                quote_ident(ext)
            ),
            Step::CreateTable(table) => table.create_statement(if_not_exists),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateDatabase(name) => write!(f, "create database {}", name),
            Step::EnableExtension(ext) => write!(f, "enable extension {}", ext),
            Step::CreateTable(table) => write!(f, "create table {}", table.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub kind: SchemaKind,
    pub database: DatabaseName,
    pub steps: Vec<Step>,
    pub if_not_exists: bool,
}

impl Plan {
    pub fn new(kind: SchemaKind, database: DatabaseName, geo_extension: &str) -> Self {
        let mut steps = vec![Step::CreateDatabase(database.clone())];
        if kind == SchemaKind::Location {
            steps.push(Step::EnableExtension(geo_extension.to_string()));
        }
        steps.extend(kind.tables().iter().copied().map(Step::CreateTable));

        Plan {
            kind,
            database,
            steps,
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(mut self, enabled: bool) -> Self {
        self.if_not_exists = enabled;
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.steps.iter().filter_map(|step| match step {
            Step::CreateTable(table) => Some(table),
            _ => None,
        })
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match step {
            Step::EnableExtension(ext) => Some(ext.as_str()),
            _ => None,
        })
    }
}
