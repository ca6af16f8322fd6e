//! Model events and observers
//!
//! Each write a model makes is described by a `ModelEvent`; observers
//! implement `ModelObserver` or wrap a closure in `FnObserver`.

use crate::event_error::EventError;
use crate::record::Record;
use async_trait::async_trait;

/// Kinds of events a model emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEventKind {
    Create,
    Update,
    Delete,
}

impl ModelEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelEventKind::Create => "create",
            ModelEventKind::Update => "update",
            ModelEventKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ModelEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted after a write.
///
/// `input` is the record the caller passed to `save`, before any defaults
/// were filled in; `record` is the row as stored.
#[derive(Debug, Clone)]
pub enum ModelEvent<T> {
    Create { input: Record, record: T },
    Update { input: Record, record: T },
    Delete(T),
}

impl<T> ModelEvent<T> {
    pub fn kind(&self) -> ModelEventKind {
        match self {
            ModelEvent::Create { .. } => ModelEventKind::Create,
            ModelEvent::Update { .. } => ModelEventKind::Update,
            ModelEvent::Delete(_) => ModelEventKind::Delete,
        }
    }

    /// The stored (or, for deletes, the removed) record
    pub fn record(&self) -> &T {
        match self {
            ModelEvent::Create { record, .. } | ModelEvent::Update { record, .. } => record,
            ModelEvent::Delete(record) => record,
        }
    }
}

#[async_trait]
pub trait ModelObserver<T>: Send + Sync {
    async fn handle(&self, event: &ModelEvent<T>) -> Result<(), EventError>;
}

/// Observer backed by a plain function
pub struct FnObserver<F> {
    f: F,
}

impl<F> FnObserver<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F> ModelObserver<T> for FnObserver<F>
where
    T: Send + Sync,
    F: Fn(&ModelEvent<T>) -> Result<(), EventError> + Send + Sync,
{
    async fn handle(&self, event: &ModelEvent<T>) -> Result<(), EventError> {
        (self.f)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        id: i64,
        name: String,
    }

    impl Default for TestUser {
        fn default() -> Self {
            Self {
                id: 1,
                name: "Test User".to_string(),
            }
        }
    }

    #[derive(Clone)]
    struct TestObserver {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl TestObserver {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn get_events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelObserver<TestUser> for TestObserver {
        async fn handle(&self, event: &ModelEvent<TestUser>) -> Result<(), EventError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}: {}", event.kind(), event.record().name));
            Ok(())
        }
    }

    #[test]
    fn test_model_event_kind_and_record() {
        let event = ModelEvent::Update {
            input: Record::new().with("name", "Test User"),
            record: TestUser::default(),
        };

        assert_eq!(event.kind(), ModelEventKind::Update);
        assert_eq!(event.record().id, 1);
        assert_eq!(ModelEvent::Delete(TestUser::default()).kind(), ModelEventKind::Delete);
    }

    #[tokio::test]
    async fn test_observer_receives_event() {
        let observer = TestObserver::new();
        let event = ModelEvent::Create {
            input: Record::new().with("name", "Test User"),
            record: TestUser::default(),
        };

        observer.handle(&event).await.unwrap();

        assert_eq!(observer.get_events(), vec!["create: Test User".to_string()]);
    }

    #[tokio::test]
    async fn test_fn_observer_error_handling() {
        let observer = FnObserver::new(|_event: &ModelEvent<TestUser>| -> Result<(), EventError> {
            Err(EventError::validation("Email already exists"))
        });

        let result = observer.handle(&ModelEvent::Delete(TestUser::default())).await;

        match result {
            Err(EventError::Validation { message, .. }) => {
                assert_eq!(message, "Email already exists");
            }
            _ => panic!("Expected validation error"),
        }
    }
}
