//! Observer registry for a single model

use crate::event_error::EventError;
use crate::events::{FnObserver, ModelEvent, ModelEventKind, ModelObserver};
use crate::record::Record;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

type ObserverList<T> = Vec<Arc<dyn ModelObserver<T>>>;

/// Per-model observer table: each event kind maps to its observers in
/// registration order
pub struct ModelEvents<T> {
    observers: RwLock<HashMap<ModelEventKind, ObserverList<T>>>,
}

impl<T> ModelEvents<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
        }
    }

    pub fn observe(&self, kind: ModelEventKind, observer: impl ModelObserver<T> + 'static) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(Arc::new(observer));
    }

    /// Listen for inserts: called with the input record and the stored row
    pub fn on_create<F>(&self, listener: F)
    where
        F: Fn(&Record, &T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.observe(
            ModelEventKind::Create,
            FnObserver::new(move |event: &ModelEvent<T>| match event {
                ModelEvent::Create { input, record } => listener(input, record),
                _ => Ok(()),
            }),
        );
    }

    /// Listen for updates: called with the input record and the stored row
    pub fn on_update<F>(&self, listener: F)
    where
        F: Fn(&Record, &T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.observe(
            ModelEventKind::Update,
            FnObserver::new(move |event: &ModelEvent<T>| match event {
                ModelEvent::Update { input, record } => listener(input, record),
                _ => Ok(()),
            }),
        );
    }

    /// Listen for deletes: called with the row as it was before deletion
    pub fn on_delete<F>(&self, listener: F)
    where
        F: Fn(&T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.observe(
            ModelEventKind::Delete,
            FnObserver::new(move |event: &ModelEvent<T>| match event {
                ModelEvent::Delete(record) => listener(record),
                _ => Ok(()),
            }),
        );
    }

    pub fn has_observers(&self, kind: ModelEventKind) -> bool {
        self.observer_count(kind) > 0
    }

    pub fn observer_count(&self, kind: ModelEventKind) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to every observer of its kind, stopping at the first failure
    pub async fn emit(&self, event: &ModelEvent<T>) -> Result<(), EventError> {
        let observers = self.snapshot(event.kind());
        debug!("Emitting {} event to {} observer(s)", event.kind(), observers.len());

        for observer in observers {
            observer.handle(event).await?;
        }
        Ok(())
    }

    fn snapshot(&self, kind: ModelEventKind) -> ObserverList<T> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }
}

impl<T> Default for ModelEvents<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        id: i64,
        name: String,
    }

    fn user(name: &str) -> TestUser {
        TestUser {
            id: 1,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_listeners_run_in_registration_order() {
        let events = ModelEvents::<TestUser>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        events.on_update(move |_input, record| {
            first.lock().unwrap().push(format!("first: {}", record.name));
            Ok(())
        });
        let second = Arc::clone(&log);
        events.on_update(move |input, _record| {
            second.lock().unwrap().push(format!("second: {} fields", input.len()));
            Ok(())
        });

        let event = ModelEvent::Update {
            input: Record::new().with("id", 1).with("name", "foo2"),
            record: user("foo2"),
        };
        events.emit(&event).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first: foo2".to_string(), "second: 2 fields".to_string()]
        );
    }

    #[tokio::test]
    async fn test_emit_only_reaches_matching_kind() {
        let events = ModelEvents::<TestUser>::new();
        let deleted = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&deleted);
        events.on_delete(move |record| {
            sink.lock().unwrap().push(record.name.clone());
            Ok(())
        });

        assert!(events.has_observers(ModelEventKind::Delete));
        assert!(!events.has_observers(ModelEventKind::Create));

        events
            .emit(&ModelEvent::Create {
                input: Record::new(),
                record: user("ignored"),
            })
            .await
            .unwrap();
        events.emit(&ModelEvent::Delete(user("gone"))).await.unwrap();

        assert_eq!(*deleted.lock().unwrap(), vec!["gone".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_listener_stops_emission() {
        let events = ModelEvents::<TestUser>::new();
        let reached = Arc::new(Mutex::new(false));

        events.on_create(|_input, _record| Err(EventError::observer("Creation not allowed")));
        let flag = Arc::clone(&reached);
        events.on_create(move |_input, _record| {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let result = events
            .emit(&ModelEvent::Create {
                input: Record::new(),
                record: user("foo"),
            })
            .await;

        assert!(result.is_err());
        assert!(!*reached.lock().unwrap());
        assert_eq!(events.observer_count(ModelEventKind::Create), 2);
    }
}
