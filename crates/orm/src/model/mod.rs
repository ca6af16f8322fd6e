//! Model System - typed table wrappers
//!
//! A `Model<T>` binds one table to a row type `T` and provides the
//! save/fetch/delete operations for it:
//!
//! - `builder`: `ModelBuilder`, the only way to configure a model
//! - `options`: per-call `SaveOptions` / `QueryOptions`
//! - `crud_operations`: save, fetch and delete
//! - `delete_strategy`: pluggable delete behavior and `HardDelete`
//! - `lifecycle`: event dispatch, deferred to commit inside transactions

pub mod builder;
pub mod crud_operations;
pub mod delete_strategy;
pub mod lifecycle;
pub mod options;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backends::Database;
use crate::error::{ErrorOverrides, ModelResult};
use crate::observers::ModelEvents;
use crate::query::TableQuery;
use crate::record::Record;

pub use builder::ModelBuilder;
pub use delete_strategy::{DeleteStrategy, HardDelete};
pub use options::{QueryOptions, SaveOptions};

/// Converts a fetched row into the model's record type
pub type ParseStrategy<T> = Arc<dyn Fn(Record) -> ModelResult<T> + Send + Sync>;

/// Typed wrapper around one table.
///
/// Configuration is fixed when the model is built; the only mutable part is
/// the event observer table reachable through `events()`.
pub struct Model<T> {
    db: Arc<dyn Database>,
    table: String,
    id_field: String,
    created_field: Option<String>,
    updated_field: Option<String>,
    deleted_field: Option<String>,
    delete_strategy: Option<Arc<dyn DeleteStrategy<T>>>,
    parse_strategy: Option<ParseStrategy<T>>,
    errors: ErrorOverrides,
    events: Arc<ModelEvents<T>>,
}

impl<T> Model<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Start configuring a model for `table`, bound to `db` by default
    pub fn builder(db: Arc<dyn Database>, table: impl Into<String>) -> ModelBuilder<T> {
        ModelBuilder::new(db, table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn created_field(&self) -> Option<&str> {
        self.created_field.as_deref()
    }

    pub fn updated_field(&self) -> Option<&str> {
        self.updated_field.as_deref()
    }

    pub fn deleted_field(&self) -> Option<&str> {
        self.deleted_field.as_deref()
    }

    /// Observer table for this model's create/update/delete events
    pub fn events(&self) -> &ModelEvents<T> {
        &self.events
    }

    /// The handle used when a call does not supply its own
    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    fn resolve<'a>(&'a self, db: Option<&'a dyn Database>) -> &'a dyn Database {
        db.unwrap_or(&*self.db)
    }

    fn query(&self, db: &dyn Database) -> TableQuery<'_> {
        TableQuery::new(&self.table, db.dialect())
    }

    fn parse(&self, row: Record) -> ModelResult<T> {
        match &self.parse_strategy {
            Some(parse) => parse(row),
            None => row.deserialize(),
        }
    }
}

impl<T> fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("table", &self.table)
            .field("id_field", &self.id_field)
            .field("created_field", &self.created_field)
            .field("updated_field", &self.updated_field)
            .field("deleted_field", &self.deleted_field)
            .field("delete_strategy", &self.delete_strategy.is_some())
            .field("parse_strategy", &self.parse_strategy.is_some())
            .finish()
    }
}
