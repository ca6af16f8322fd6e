//! Event dispatch for model writes

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::Model;
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;

impl<T> Model<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Deliver `event` to this model's observers.
    ///
    /// On a transaction handle delivery is queued on its commit hooks, so
    /// observers only ever see committed writes. Otherwise observers run now
    /// and their failure is the caller's failure.
    pub(crate) async fn dispatch(&self, db: &dyn Database, event: ModelEvent<T>) -> ModelResult<()> {
        match db.transaction() {
            Some(hooks) => {
                debug!(table = %self.table, "deferring {} event until commit", event.kind());
                let events = Arc::clone(&self.events);
                hooks.on_commit(move || async move { events.emit(&event).await });
                Ok(())
            }
            None => self.events.emit(&event).await.map_err(ModelError::from),
        }
    }
}
