//! Core types and traits for system event dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::registry::MetadataStore;

/// A named occurrence published by the host, carrying a payload that handler
/// filters are evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent<P> {
    pub name: String,
    pub payload: P,
}

impl<P> SystemEvent<P> {
    pub fn new(name: impl Into<String>, payload: P) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// A type whose methods handle system events.
///
/// `register_handlers` is the type's static initializer: it runs once while
/// the application builds its `MetadataStore` and registers each handler
/// method, usually through [`system_event_handler!`](crate::system_event_handler).
pub trait SystemEventHandlers: Sized + 'static {
    /// Payload type of the events this type handles.
    type Payload: Send + Sync + 'static;

    fn register_handlers(store: &mut MetadataStore);
}

/// An event as recorded by an `EventSink`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub seq: i64,
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub event_name: String,
    /// The event whose handler emitted this one.
    pub parent_seq: Option<i64>,
    /// The root event of the dispatch that produced this one.
    pub caused_by_seq: Option<i64>,
    pub run_id: Option<String>,
    pub payload: serde_json::Value,
}

/// Records dispatched events and assigns sequence numbers.
///
/// Implemented by `MemoryEventSink` and `NullSink`, and for `Arc<S>` so a
/// sink can be shared with the code that inspects it.
pub trait EventSink: Send + Sync {
    /// Record an event published from outside the engine.
    fn record(
        &self,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent>;

    /// Record an event emitted by a handler of `parent_seq`. `caused_by_seq`
    /// is the root event of the dispatch.
    fn record_child(
        &self,
        parent_seq: i64,
        caused_by_seq: i64,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent>;
}
