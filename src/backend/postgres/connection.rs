//! PostgreSQL backend built on a SQLx connection pool.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::debug;

use super::schema;
use super::types::{bind_value, cast_expr, quote_ident, PgValueConverter};
use crate::backend::{BackendKind, ColumnInfo, FieldInput, RelationalBackend};
use crate::config::RelationalConfig;
use crate::error::{Result, StoreError};
use crate::row::{Row, Value};

/// Live connection to the relational backend.
pub struct PostgresConnection {
    pool: PgPool,
}

impl PostgresConnection {
    /// Open a pooled connection and verify it with a ping.
    pub async fn connect(config: &RelationalConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::connection(format!(
                    "PostgreSQL at {}:{}/{}: {}",
                    config.host, config.port, config.database, e
                ))
            })?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| StoreError::connection(format!("PostgreSQL ping failed: {e}")))?;

        Ok(Self { pool })
    }

    async fn columns_by_name(&self, table: &str) -> Result<HashMap<String, ColumnInfo>> {
        let columns = schema::table_columns(&self.pool, table)
            .await
            .map_err(|e| StoreError::schema_fetch(table, e))?;
        Ok(columns
            .into_iter()
            .map(|col| (col.name.clone(), col))
            .collect())
    }
}

#[async_trait]
impl RelationalBackend for PostgresConnection {
    async fn table_names(&self) -> Result<Vec<String>> {
        schema::table_names(&self.pool)
            .await
            .map_err(|e| StoreError::catalog_fetch(BackendKind::Relational, e))
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        schema::table_columns(&self.pool, table)
            .await
            .map_err(|e| StoreError::schema_fetch(table, e))
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        let statement = format!("SELECT * FROM {}", quote_ident(table));
        debug!(table, "fetching rows");

        let rows = sqlx::query(&statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::execution(BackendKind::Relational, e))?;

        Ok(rows.iter().map(PgValueConverter::convert_row).collect())
    }

    async fn insert(&self, table: &str, fields: &[FieldInput]) -> Result<()> {
        let columns = self.columns_by_name(table).await?;

        let names = fields
            .iter()
            .map(|f| quote_ident(&f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = fields
            .iter()
            .enumerate()
            .map(|(i, f)| cast_expr(columns.get(&f.name), i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            names,
            placeholders
        );
        debug!(table, %statement, "inserting row");

        let mut query = sqlx::query(&statement);
        for field in fields {
            query = query.bind(field.value.as_deref());
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::execution(BackendKind::Relational, e))?;

        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
        fields: &[FieldInput],
    ) -> Result<u64> {
        let columns = self.columns_by_name(table).await?;

        let assignments = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                format!(
                    "{} = {}",
                    quote_ident(&f.name),
                    cast_expr(columns.get(&f.name), i + 1)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let statement = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            quote_ident(table),
            assignments,
            quote_ident(key_column),
            fields.len() + 1
        );
        debug!(table, %statement, "updating row");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::execution(BackendKind::Relational, e))?;

        let mut query = sqlx::query(&statement);
        for field in fields {
            query = query.bind(field.value.as_deref());
        }
        query = bind_value(query, key);

        let outcome = query.execute(&mut *tx).await;
        match outcome {
            Ok(result) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::execution(BackendKind::Relational, e))?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                tx.rollback().await.ok();
                Err(StoreError::execution(BackendKind::Relational, e))
            }
        }
    }

    async fn delete(&self, table: &str, key_column: &str, key: &Value) -> Result<u64> {
        let statement = format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_ident(table),
            quote_ident(key_column)
        );
        debug!(table, %statement, "deleting row");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::execution(BackendKind::Relational, e))?;

        let query = bind_value(sqlx::query(&statement), key);
        let outcome = query.execute(&mut *tx).await;
        match outcome {
            Ok(result) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::execution(BackendKind::Relational, e))?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                tx.rollback().await.ok();
                Err(StoreError::execution(BackendKind::Relational, e))
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
