//! `information_schema` queries for live relational metadata.

use sqlx::PgPool;
use sqlx::Row as SqlxRow;

use crate::backend::ColumnInfo;

/// Names of base tables in the `public` schema, in catalog order.
pub(crate) async fn table_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    // information_schema exposes domain types (sql_identifier and friends)
    // that sqlx will not decode directly, hence the casts.
    let rows = sqlx::query(
        r#"
        SELECT table_name::text AS table_name
        FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_type = 'BASE TABLE'
        ORDER BY table_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("table_name"))
        .collect()
}

/// Column metadata for one table, in ordinal order.
pub(crate) async fn table_columns(
    pool: &PgPool,
    table: &str,
) -> Result<Vec<ColumnInfo>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT column_name::text AS column_name,
               data_type::text AS data_type,
               udt_name::text AS udt_name,
               is_nullable::text AS is_nullable,
               ordinal_position::int4 AS ordinal_position
        FROM information_schema.columns
        WHERE table_schema = 'public'
          AND table_name = $1
        ORDER BY ordinal_position
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ColumnInfo {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                udt_name: row.try_get("udt_name")?,
                is_nullable: row.try_get::<String, _>("is_nullable")? == "YES",
                ordinal_position: row.try_get("ordinal_position")?,
            })
        })
        .collect()
}
