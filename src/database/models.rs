use serde::{Deserialize, Serialize};

/// A column as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ColumnInfo {
    pub column_name: String,
    pub udt_name: String,
    pub ordinal_position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtensionInfo {
    pub extname: String,
    pub extversion: String,
}
