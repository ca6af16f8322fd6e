//! Delete Strategies - pluggable delete behavior

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::Model;
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::query::TableQuery;
use crate::record::Record;

/// Replaces a model's default (soft) delete.
///
/// Receives the row found by `delete`, the handle the call runs on (which
/// may be a transaction) and the model itself.
#[async_trait]
pub trait DeleteStrategy<T>: Send + Sync {
    async fn delete(&self, record: &T, db: &dyn Database, model: &Model<T>) -> ModelResult<()>;
}

/// Physically removes the row by id
#[derive(Debug, Clone, Copy, Default)]
pub struct HardDelete;

#[async_trait]
impl<T> DeleteStrategy<T> for HardDelete
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn delete(&self, record: &T, db: &dyn Database, model: &Model<T>) -> ModelResult<()> {
        let fields = Record::from_serialize(record)?;
        let id = fields
            .get(model.id_field())
            .filter(|value| !value.is_null())
            .ok_or_else(|| {
                ModelError::Serialization(format!(
                    "Cannot hard delete from '{}' without a '{}' value",
                    model.table(),
                    model.id_field()
                ))
            })?;

        let statement = TableQuery::new(model.table(), db.dialect()).delete_by(model.id_field(), id);
        debug!(table = %model.table(), sql = %statement.sql, "hard deleting record");
        db.execute(&statement.sql, &statement.params).await?;
        Ok(())
    }
}
