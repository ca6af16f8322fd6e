//! PostgreSQL Backend Implementation
//!
//! This module provides the PostgreSQL-specific implementation of the
//! `Database` trait using sqlx as the underlying database driver.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::debug;

use super::core::*;
use crate::config::PoolConfig;
use crate::error::{ModelError, ModelResult};
use crate::record::Record;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL pool handle
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool for `database_url` with the given pool settings
    pub async fn connect(database_url: &str, config: &PoolConfig) -> ModelResult<Self> {
        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .idle_timeout(config.idle_timeout.map(Duration::from_secs))
            .max_lifetime(config.max_lifetime.map(Duration::from_secs))
            .test_before_acquire(config.test_before_acquire);

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to create PostgreSQL pool: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction on a pooled connection
    pub async fn begin(&self) -> ModelResult<PostgresTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ModelError::Transaction(format!("Failed to begin transaction: {}", e)))?;
        debug!("PostgreSQL transaction started");

        Ok(PostgresTransaction {
            tx: Mutex::new(Some(tx)),
            hooks: TransactionHooks::new(),
        })
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<u64> {
        debug!(sql, "executing statement");
        let result = bind_all(sqlx::query(sql), params).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Option<Record>> {
        debug!(sql, "fetching row");
        let row = bind_all(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }
}

/// PostgreSQL transaction handle.
///
/// Statements run on the transaction's connection one at a time. Hooks
/// queued through `transaction()` run after `commit` succeeds and are
/// discarded on `rollback`.
pub struct PostgresTransaction {
    tx: Mutex<Option<sqlx::Transaction<'static, Postgres>>>,
    hooks: TransactionHooks,
}

impl PostgresTransaction {
    pub async fn commit(self) -> ModelResult<()> {
        let tx = self
            .tx
            .into_inner()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ModelError::Transaction(format!("Failed to commit transaction: {}", e)))?;
        debug!("PostgreSQL transaction committed, running {} hook(s)", self.hooks.pending());

        TransactionHooks::run(self.hooks.take()).await
    }

    pub async fn rollback(self) -> ModelResult<()> {
        let tx = self
            .tx
            .into_inner()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        tx.rollback()
            .await
            .map_err(|e| ModelError::Transaction(format!("Failed to rollback transaction: {}", e)))?;
        debug!("PostgreSQL transaction rolled back, dropping {} hook(s)", self.hooks.pending());

        Ok(())
    }
}

#[async_trait]
impl Database for PostgresTransaction {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<u64> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        debug!(sql, "executing statement in transaction");
        let result = bind_all(sqlx::query(sql), params).execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Option<Record>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        debug!(sql, "fetching row in transaction");
        let row = bind_all(sqlx::query(sql), params)
            .fetch_optional(&mut **tx)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    fn transaction(&self) -> Option<&TransactionHooks> {
        Some(&self.hooks)
    }
}

fn bind_all<'q>(query: PgQuery<'q>, params: &[DatabaseValue]) -> PgQuery<'q> {
    params.iter().fold(query, bind_database_value)
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'q>(query: PgQuery<'q>, value: &DatabaseValue) -> PgQuery<'q> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Time(t) => query.bind(*t),
        DatabaseValue::Json(j) => query.bind(j.clone()),
    }
}

fn row_to_record(row: &PgRow) -> ModelResult<Record> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.set(column.name(), postgres_value_to_database_value(row, index)?);
    }
    Ok(record)
}

/// Convert a PostgreSQL column value to DatabaseValue
fn postgres_value_to_database_value(row: &PgRow, index: usize) -> ModelResult<DatabaseValue> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = row.columns()[index].type_info().name();

    let value = match type_name {
        "BOOL" => DatabaseValue::Bool(row.try_get(index)?),
        "INT2" => DatabaseValue::Int32(i32::from(row.try_get::<i16, _>(index)?)),
        "INT4" => DatabaseValue::Int32(row.try_get(index)?),
        "INT8" => DatabaseValue::Int64(row.try_get(index)?),
        "FLOAT4" => DatabaseValue::Float64(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => DatabaseValue::Float64(row.try_get(index)?),
        "BYTEA" => DatabaseValue::Bytes(row.try_get(index)?),
        "UUID" => DatabaseValue::Uuid(row.try_get(index)?),
        "TIMESTAMPTZ" => DatabaseValue::DateTime(row.try_get(index)?),
        "TIMESTAMP" => {
            let naive: chrono::NaiveDateTime = row.try_get(index)?;
            DatabaseValue::DateTime(naive.and_utc())
        }
        "DATE" => DatabaseValue::Date(row.try_get(index)?),
        "TIME" => DatabaseValue::Time(row.try_get(index)?),
        "JSON" | "JSONB" => DatabaseValue::Json(row.try_get(index)?),
        _ => {
            let value: String = row.try_get(index).map_err(|e| {
                ModelError::Database(format!(
                    "Failed to get value as string for unknown type '{}': {}",
                    type_name, e
                ))
            })?;
            DatabaseValue::String(value)
        }
    };

    Ok(value)
}
