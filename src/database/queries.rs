use sqlx::{PgConnection, PgPool};
use crate::database::models::*;
use crate::database::schema::quote_ident;

/// Catalog lookups.
pub struct Queries;

impl Queries {
    /// Ordinary tables in `public`, excluding tables owned by extensions
    /// (such as `spatial_ref_sys`).
    pub async fn list_tables(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let tables: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT c.relname::text
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = 'public'
              AND c.relkind = 'r'
              AND NOT EXISTS (
                  SELECT 1 FROM pg_depend d
                  WHERE d.classid = 'pg_class'::regclass
                    AND d.objid = c.oid
                    AND d.deptype = 'e'
              )
            ORDER BY c.relname
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tables.into_iter().map(|(name,)| name).collect())
    }

    pub async fn list_columns(pool: &PgPool, table: &str) -> Result<Vec<ColumnInfo>, sqlx::Error> {
        sqlx::query_as::<_, ColumnInfo>(
            r#"
            SELECT column_name::text AS column_name,
                   udt_name::text AS udt_name,
                   ordinal_position::int4 AS ordinal_position
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(pool)
        .await
    }

    pub async fn extension(pool: &PgPool, name: &str) -> Result<Option<ExtensionInfo>, sqlx::Error> {
        sqlx::query_as::<_, ExtensionInfo>(
            "SELECT extname::text AS extname, extversion FROM pg_extension WHERE extname = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn extension_installed(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        Ok(Self::extension(pool, name).await?.is_some())
    }

    pub async fn database_exists(conn: &mut PgConnection, name: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(name)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    pub async fn table_exists(conn: &mut PgConnection, table: &str) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(format!("public.{}", quote_ident(table)))
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    pub async fn extension_exists(conn: &mut PgConnection, name: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_extension WHERE extname = $1)")
                .bind(name)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }
}
