//! CRUD Operations - save, fetch and delete for models
//!
//! `save` decides between insert and update with a single id probe, stamps
//! the configured timestamp fields and optionally reads the stored row back.
//! Fetches hide soft-deleted rows. Deletes go through the configured delete
//! strategy, fall back to a soft delete, or fail.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{Model, QueryOptions, SaveOptions};
use crate::backends::{Database, DatabaseValue};
use crate::error::{ErrorCode, ModelError, ModelResult};
use crate::events::{ModelEvent, ModelEventKind};
use crate::record::Record;

impl<T> Model<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Insert or update `record`.
    ///
    /// Returns the stored row when `opts.return_new` is set, `None` otherwise.
    pub async fn save(&self, record: Record, opts: SaveOptions<'_>) -> ModelResult<Option<T>> {
        let db = self.resolve(opts.db);
        let input = record.clone();

        let mut values = record;
        for (_, value) in values.iter_mut() {
            if value.is_null() {
                *value = DatabaseValue::Null;
            }
        }

        let id = values
            .remove(&self.id_field)
            .filter(|value| !value.is_null());
        if values.is_empty() {
            return Err(self.errors.resolve(ErrorCode::NothingToSave));
        }

        let exists = match &id {
            Some(id) => self.exists(db, id).await?,
            None => false,
        };

        let (kind, id) = match id {
            Some(id) if exists => {
                stamp(&mut values, self.updated_field.as_deref());
                let statement = self.query(db).update_by(&self.id_field, &id, &values);
                debug!(table = %self.table, sql = %statement.sql, "updating record");
                db.execute(&statement.sql, &statement.params).await?;
                (ModelEventKind::Update, id)
            }
            id => {
                if let Some(id) = id {
                    values.set(self.id_field.clone(), id);
                }
                stamp(&mut values, self.created_field.as_deref());
                let statement = self.query(db).insert(&values, &self.id_field);
                debug!(table = %self.table, sql = %statement.sql, "inserting record");
                let returned = db
                    .fetch_optional(&statement.sql, &statement.params)
                    .await?
                    .ok_or_else(|| {
                        ModelError::Database(format!("Insert into '{}' returned no row", self.table))
                    })?;
                (ModelEventKind::Create, self.id_of(&returned)?)
            }
        };

        let notify = self.events.has_observers(kind);
        if !opts.return_new && !notify {
            return Ok(None);
        }

        let by_id = Record::new().with(self.id_field.clone(), id);
        let stored = if opts.return_new {
            self.fetch_raw(db, &by_id, true).await?
        } else {
            None
        };

        if notify {
            // the event sees the row even if this write soft-deleted it
            let current = match &stored {
                Some(row) => Some(row.clone()),
                None => self.fetch_raw(db, &by_id, false).await?,
            };
            if let Some(row) = current {
                let record = self.parse(row)?;
                let event = match kind {
                    ModelEventKind::Create => ModelEvent::Create { input, record },
                    _ => ModelEvent::Update { input, record },
                };
                self.dispatch(db, event).await?;
            }
        }

        stored.map(|row| self.parse(row)).transpose()
    }

    /// `save` that always returns the stored row
    pub async fn save_and_fetch(&self, record: Record, opts: SaveOptions<'_>) -> ModelResult<T> {
        let opts = SaveOptions {
            return_new: true,
            ..opts
        };
        self.save(record, opts)
            .await?
            .ok_or_else(|| self.errors.resolve(ErrorCode::FailedToSave))
    }

    /// First row matching every field of `filter`; soft-deleted rows never match
    pub async fn fetch(&self, filter: Record, opts: QueryOptions<'_>) -> ModelResult<Option<T>> {
        let db = self.resolve(opts.db);
        self.fetch_raw(db, &filter, true)
            .await?
            .map(|row| self.parse(row))
            .transpose()
    }

    pub async fn fetch_or_fail(&self, filter: Record, opts: QueryOptions<'_>) -> ModelResult<T> {
        self.fetch(filter, opts)
            .await?
            .ok_or_else(|| self.errors.resolve(ErrorCode::RecordNotFound))
    }

    /// Delete the first row matching `filter`, doing nothing if there is none
    pub async fn delete(&self, filter: Record, opts: QueryOptions<'_>) -> ModelResult<()> {
        let db = self.resolve(opts.db);

        let Some(row) = self.fetch_raw(db, &filter, true).await? else {
            debug!(table = %self.table, "nothing to delete");
            return Ok(());
        };

        if let Some(strategy) = &self.delete_strategy {
            let found = self.parse(row)?;
            strategy.delete(&found, db, self).await?;
            return self.notify_deleted(db, found).await;
        }

        let Some(deleted_field) = &self.deleted_field else {
            return Err(self.errors.resolve(ErrorCode::DeleteNotImplemented));
        };

        let mut soft = filter;
        soft.set(self.id_field.clone(), self.id_of(&row)?);
        soft.set(deleted_field.clone(), Utc::now());
        debug!(table = %self.table, field = %deleted_field, "soft deleting record");
        self.save(soft, SaveOptions::new().with_db(db)).await?;

        let found = self.parse(row)?;
        self.notify_deleted(db, found).await
    }

    async fn notify_deleted(&self, db: &dyn Database, found: T) -> ModelResult<()> {
        if self.events.has_observers(ModelEventKind::Delete) {
            self.dispatch(db, ModelEvent::Delete(found)).await?;
        }
        Ok(())
    }

    async fn exists(&self, db: &dyn Database, id: &DatabaseValue) -> ModelResult<bool> {
        let statement = self.query(db).first_by(&self.id_field, &self.id_field, id);
        let row = db.fetch_optional(&statement.sql, &statement.params).await?;
        Ok(row.is_some())
    }

    /// First raw row matching `filter`, optionally hiding soft-deleted rows
    async fn fetch_raw(
        &self,
        db: &dyn Database,
        filter: &Record,
        hide_deleted: bool,
    ) -> ModelResult<Option<Record>> {
        let null_fields: Vec<&str> = match &self.deleted_field {
            Some(field) if hide_deleted => vec![field.as_str()],
            _ => Vec::new(),
        };
        let statement = self.query(db).first_where(filter, &null_fields);
        debug!(table = %self.table, sql = %statement.sql, "fetching record");
        db.fetch_optional(&statement.sql, &statement.params).await
    }

    fn id_of(&self, row: &Record) -> ModelResult<DatabaseValue> {
        row.get(&self.id_field)
            .filter(|value| !value.is_null())
            .cloned()
            .ok_or_else(|| {
                ModelError::Database(format!(
                    "Row from '{}' has no '{}' value",
                    self.table, self.id_field
                ))
            })
    }
}

/// Set `field` to the current time unless the record already carries a value
fn stamp(values: &mut Record, field: Option<&str>) {
    if let Some(field) = field {
        if values.is_absent(field) {
            values.set(field, Utc::now());
        }
    }
}
