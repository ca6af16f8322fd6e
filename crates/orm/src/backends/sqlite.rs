//! SQLite Backend Implementation
//!
//! sqlx-backed SQLite handle. Column values are decoded by their stored
//! type, with the declared column type deciding booleans and timestamps.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::debug;

use super::core::*;
use crate::config::PoolConfig;
use crate::error::{ModelError, ModelResult};
use crate::record::Record;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite pool handle
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `database_url` with the given pool settings
    pub async fn connect(database_url: &str, config: &PoolConfig) -> ModelResult<Self> {
        let options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .idle_timeout(config.idle_timeout.map(Duration::from_secs))
            .max_lifetime(config.max_lifetime.map(Duration::from_secs))
            .test_before_acquire(config.test_before_acquire);

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to create SQLite pool: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Private in-memory database.
    ///
    /// Uses a single connection that is never recycled, since every SQLite
    /// memory connection is a separate database.
    pub async fn in_memory() -> ModelResult<Self> {
        let config = PoolConfig {
            max_connections: 1,
            min_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
            ..PoolConfig::default()
        };
        Self::connect("sqlite::memory:", &config).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction on a pooled connection
    pub async fn begin(&self) -> ModelResult<SqliteTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ModelError::Transaction(format!("Failed to begin transaction: {}", e)))?;
        debug!("SQLite transaction started");

        Ok(SqliteTransaction {
            tx: Mutex::new(Some(tx)),
            hooks: TransactionHooks::new(),
        })
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
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

/// SQLite transaction handle; hooks run after `commit`, dropped on `rollback`
pub struct SqliteTransaction {
    tx: Mutex<Option<sqlx::Transaction<'static, Sqlite>>>,
    hooks: TransactionHooks,
}

impl SqliteTransaction {
    pub async fn commit(self) -> ModelResult<()> {
        let tx = self
            .tx
            .into_inner()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ModelError::Transaction(format!("Failed to commit transaction: {}", e)))?;
        debug!("SQLite transaction committed, running {} hook(s)", self.hooks.pending());

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
        debug!("SQLite transaction rolled back, dropping {} hook(s)", self.hooks.pending());

        Ok(())
    }
}

#[async_trait]
impl Database for SqliteTransaction {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
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

fn bind_all<'q>(query: SqliteQuery<'q>, params: &[DatabaseValue]) -> SqliteQuery<'q> {
    params.iter().fold(query, bind_database_value)
}

fn bind_database_value<'q>(query: SqliteQuery<'q>, value: &DatabaseValue) -> SqliteQuery<'q> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        // stored as text so they compare equal to hand-written literals
        DatabaseValue::Uuid(u) => query.bind(u.to_string()),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Time(t) => query.bind(*t),
        DatabaseValue::Json(j) => query.bind(j.to_string()),
    }
}

fn row_to_record(row: &SqliteRow) -> ModelResult<Record> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.set(column.name(), sqlite_value_to_database_value(row, index)?);
    }
    Ok(record)
}

fn sqlite_value_to_database_value(row: &SqliteRow, index: usize) -> ModelResult<DatabaseValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let storage = raw.type_info().name().to_string();
    let declared = row.columns()[index].type_info().name();

    let value = match (storage.as_str(), declared) {
        ("INTEGER", "BOOLEAN") => DatabaseValue::Bool(row.try_get(index)?),
        ("INTEGER", _) => DatabaseValue::Int64(row.try_get(index)?),
        ("REAL", _) => DatabaseValue::Float64(row.try_get(index)?),
        ("BLOB", _) => DatabaseValue::Bytes(row.try_get(index)?),
        ("TEXT", "DATETIME") => match row.try_get::<chrono::DateTime<chrono::Utc>, _>(index) {
            Ok(dt) => DatabaseValue::DateTime(dt),
            Err(_) => DatabaseValue::String(row.try_get(index)?),
        },
        _ => DatabaseValue::String(row.try_get(index)?),
    };

    Ok(value)
}
