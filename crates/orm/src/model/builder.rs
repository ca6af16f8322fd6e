//! Model configuration

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{DeleteStrategy, Model, ParseStrategy};
use crate::backends::Database;
use crate::error::{ErrorCode, ErrorOverrides, ModelError, ModelResult};
use crate::observers::ModelEvents;
use crate::record::Record;

/// Builder for `Model<T>`.
///
/// Only the table is required. The id field defaults to `id`; timestamps,
/// soft deletes, delete and parse strategies and error overrides are opt-in.
pub struct ModelBuilder<T> {
    db: Arc<dyn Database>,
    table: String,
    id_field: String,
    created_field: Option<String>,
    updated_field: Option<String>,
    deleted_field: Option<String>,
    delete_strategy: Option<Arc<dyn DeleteStrategy<T>>>,
    parse_strategy: Option<ParseStrategy<T>>,
    errors: ErrorOverrides,
}

impl<T> ModelBuilder<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(db: Arc<dyn Database>, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            id_field: "id".to_string(),
            created_field: None,
            updated_field: None,
            deleted_field: None,
            delete_strategy: None,
            parse_strategy: None,
            errors: ErrorOverrides::new(),
        }
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Stamped with the current time on insert when the caller leaves it empty
    pub fn created_field(mut self, field: impl Into<String>) -> Self {
        self.created_field = Some(field.into());
        self
    }

    /// Stamped with the current time on update when the caller leaves it empty
    pub fn updated_field(mut self, field: impl Into<String>) -> Self {
        self.updated_field = Some(field.into());
        self
    }

    /// Enables soft deletes: rows with this field set are hidden from fetches
    pub fn deleted_field(mut self, field: impl Into<String>) -> Self {
        self.deleted_field = Some(field.into());
        self
    }

    /// Replace the default delete behavior
    pub fn delete_strategy(mut self, strategy: impl DeleteStrategy<T> + 'static) -> Self {
        self.delete_strategy = Some(Arc::new(strategy));
        self
    }

    pub fn parse_strategy<F>(mut self, parse: F) -> Self
    where
        F: Fn(Record) -> ModelResult<T> + Send + Sync + 'static,
    {
        self.parse_strategy = Some(Arc::new(parse));
        self
    }

    /// Raise `error` instead of the default error for `code`
    pub fn error(mut self, code: ErrorCode, error: ModelError) -> Self {
        self.errors.insert(code, error);
        self
    }

    pub fn build(self) -> ModelResult<Model<T>> {
        if self.table.trim().is_empty() {
            return Err(ModelError::Configuration(
                "Model table name cannot be empty".to_string(),
            ));
        }

        if self.id_field.trim().is_empty() {
            return Err(ModelError::Configuration(format!(
                "Model for table '{}' needs a non-empty id field",
                self.table
            )));
        }

        Ok(Model {
            db: self.db,
            table: self.table,
            id_field: self.id_field,
            created_field: self.created_field,
            updated_field: self.updated_field,
            deleted_field: self.deleted_field,
            delete_strategy: self.delete_strategy,
            parse_strategy: self.parse_strategy,
            errors: self.errors,
            events: Arc::new(ModelEvents::new()),
        })
    }
}
