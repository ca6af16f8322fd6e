//! Core Database Backend Traits
//!
//! This module defines the storage collaborator a model talks to: a handle
//! that runs parameterized statements and, when it is a transaction, accepts
//! hooks to run once the transaction commits.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::{ModelError, ModelResult};
use crate::event_error::EventError;
use crate::record::Record;

/// Boxed future used for commit hooks
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Deferred work queued on a transaction, run after it commits
pub type CommitHook = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), EventError>> + Send>;

/// Abstract database handle: a pool or a transaction
#[async_trait]
pub trait Database: Send + Sync {
    /// SQL dialect used to render statements for this handle
    fn dialect(&self) -> SqlDialect;

    /// Execute a statement and return the affected row count
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<u64>;

    /// Execute a statement and return its first row, if any
    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> ModelResult<Option<Record>>;

    /// Commit hooks of this handle when it is a transaction
    fn transaction(&self) -> Option<&TransactionHooks> {
        None
    }
}

/// Hooks queued on an open transaction
#[derive(Default)]
pub struct TransactionHooks {
    hooks: Mutex<Vec<CommitHook>>,
}

impl TransactionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `hook` to run after the owning transaction commits
    pub fn on_commit<F, Fut>(&self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), EventError>> + Send + 'static,
    {
        self.lock().push(Box::new(move || Box::pin(hook())));
    }

    /// Number of hooks waiting for commit
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Drain the queued hooks
    pub(crate) fn take(&self) -> Vec<CommitHook> {
        std::mem::take(&mut *self.lock())
    }

    /// Run drained hooks in queue order.
    ///
    /// Every hook runs even if an earlier one fails; the first failure is
    /// returned once all of them have finished.
    pub(crate) async fn run(hooks: Vec<CommitHook>) -> ModelResult<()> {
        let mut first_error = None;

        for hook in hooks {
            if let Err(e) = hook().await {
                warn!("Commit hook failed after transaction commit: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(ModelError::from(e)),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CommitHook>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(JsonValue),
}

impl DatabaseValue {
    /// Check if the value is null, including a wrapped JSON null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null | DatabaseValue::Json(JsonValue::Null))
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Int64(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(
                b.iter()
                    .map(|&x| JsonValue::Number(serde_json::Number::from(x)))
                    .collect(),
            ),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Time(t) => JsonValue::String(t.to_string()),
            DatabaseValue::Json(j) => j.clone(),
        }
    }

    /// Create DatabaseValue from JSON value.
    ///
    /// Strings stay strings, whatever they look like; timestamps bind as
    /// `DateTime` only when set from a `DateTime` value. Arrays and objects
    /// stay JSON.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => DatabaseValue::Int32(small),
                        Err(_) => DatabaseValue::Int64(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            other => DatabaseValue::Json(other),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for DatabaseValue {
    fn from(value: DateTime<Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<NaiveDate> for DatabaseValue {
    fn from(value: NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<NaiveTime> for DatabaseValue {
    fn from(value: NaiveTime) -> Self {
        DatabaseValue::Time(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    PostgreSQL,
    SQLite,
}

impl SqlDialect {
    /// Get the parameter placeholder for the zero-based parameter `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSQL => format!("${}", index + 1),
            SqlDialect::SQLite => "?".to_string(),
        }
    }

    /// Get the quote character for identifiers in this dialect
    pub fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quote an identifier, doubling any embedded quote characters
    pub fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{}{}", quote, quote));
        format!("{}{}{}", quote, escaped, quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_from_json_numbers_pick_narrowest_integer() {
        assert_eq!(DatabaseValue::from_json(json!(7)), DatabaseValue::Int32(7));
        assert_eq!(
            DatabaseValue::from_json(json!(5_000_000_000_i64)),
            DatabaseValue::Int64(5_000_000_000)
        );
        assert_eq!(DatabaseValue::from_json(json!(1.5)), DatabaseValue::Float64(1.5));
    }

    #[test]
    fn test_from_json_keeps_timestamp_shaped_strings() {
        let value = DatabaseValue::from_json(json!("2024-03-01T10:00:00Z"));
        assert_eq!(value, DatabaseValue::String("2024-03-01T10:00:00Z".to_string()));
        assert_eq!(value.to_json(), json!("2024-03-01T10:00:00Z"));

        let plain = DatabaseValue::from_json(json!("foo"));
        assert_eq!(plain, DatabaseValue::String("foo".to_string()));
    }

    #[test]
    fn test_json_null_counts_as_null() {
        assert!(DatabaseValue::Null.is_null());
        assert!(DatabaseValue::Json(JsonValue::Null).is_null());
        assert!(!DatabaseValue::Bool(false).is_null());
        assert_eq!(DatabaseValue::from(None::<i64>), DatabaseValue::Null);
    }

    #[test]
    fn test_dialect_placeholders_and_quoting() {
        assert_eq!(SqlDialect::PostgreSQL.parameter_placeholder(0), "$1");
        assert_eq!(SqlDialect::PostgreSQL.parameter_placeholder(2), "$3");
        assert_eq!(SqlDialect::SQLite.parameter_placeholder(2), "?");
        assert_eq!(SqlDialect::SQLite.quote_identifier("users"), "\"users\"");
        assert_eq!(SqlDialect::PostgreSQL.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    async fn test_commit_hooks_run_in_order_and_report_first_failure() {
        let hooks = TransactionHooks::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        hooks.on_commit(move || async move {
            first.fetch_add(1, Ordering::SeqCst);
            Err(EventError::observer("first failed"))
        });
        let second = Arc::clone(&calls);
        hooks.on_commit(move || async move {
            second.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(hooks.pending(), 2);

        let result = TransactionHooks::run(hooks.take()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(hooks.pending(), 0);
        match result {
            Err(ModelError::Event(message)) => assert!(message.contains("first failed")),
            other => panic!("Expected event error, got {:?}", other),
        }
    }
}
