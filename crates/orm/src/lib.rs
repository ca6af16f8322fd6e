//! # rowmodel-orm: typed table models
//!
//! Active-record style data access on top of sqlx. Each table gets a
//! `Model<T>` that saves, fetches and deletes `T` rows, with optional
//! timestamp fields, soft or custom deletes, a parse strategy for fetched
//! rows and create/update/delete events that wait for transaction commit.
//!
//! ```no_run
//! # use rowmodel_orm::*;
//! # #[derive(serde::Serialize, serde::Deserialize)]
//! # struct User { id: i64, name: String }
//! # async fn demo() -> ModelResult<()> {
//! let db = connect(&DatabaseConfig::from_env()?).await?;
//! let users: Model<User> = Model::builder(db, "users")
//!     .created_field("created_at")
//!     .updated_field("updated_at")
//!     .deleted_field("deleted_at")
//!     .build()?;
//!
//! let user = users
//!     .save_and_fetch(Record::new().with("name", "foo"), SaveOptions::new())
//!     .await?;
//! users.delete(Record::new().with("id", user.id), QueryOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod event_error;
pub mod events;
pub mod model;
pub mod observers;
pub mod query;
pub mod record;

// Re-export core traits and types
pub use backends::{
    Database, DatabaseBackendType, DatabaseValue, PostgresDatabase, PostgresTransaction,
    SqlDialect, SqliteDatabase, SqliteTransaction, TransactionHooks,
};
pub use config::{connect, ConfigError, DatabaseConfig, PoolConfig};
pub use error::{ErrorCode, ErrorOverrides, ModelError, ModelResult};
pub use event_error::EventError;
pub use events::{FnObserver, ModelEvent, ModelEventKind, ModelObserver};
pub use model::{DeleteStrategy, HardDelete, Model, ModelBuilder, ParseStrategy, QueryOptions, SaveOptions};
pub use observers::ModelEvents;
pub use query::{Statement, TableQuery};
pub use record::Record;
