//! EventSink implementations.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::traits::{EventSink, RecordedEvent};

// ---------------------------------------------------------------------------
// MemoryEventSink
// ---------------------------------------------------------------------------

/// In-memory event log. Assigns incrementing sequence numbers and keeps every
/// recorded event for inspection. Thread-safe.
pub struct MemoryEventSink {
    next_seq: AtomicI64,
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicI64::new(1),
            events: Mutex::new(Vec::new()),
        }
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events emitted directly by handlers of `seq`.
    pub fn children_of(&self, seq: i64) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.parent_seq == Some(seq))
            .collect()
    }

    fn append(
        &self,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
        chain: Option<(i64, i64)>,
    ) -> Result<RecordedEvent> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| EngineError::Sink(e.to_string()))?;

        let recorded = RecordedEvent {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            id: Uuid::new_v4(),
            ts: Utc::now(),
            event_name: event_name.to_string(),
            parent_seq: chain.map(|(parent, _)| parent),
            caused_by_seq: chain.map(|(_, root)| root),
            run_id: Some(run_id.to_string()),
            payload,
        };
        events.push(recorded.clone());
        Ok(recorded)
    }
}

impl Default for MemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MemoryEventSink {
    fn record(
        &self,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent> {
        self.append(event_name, payload, run_id, None)
    }

    fn record_child(
        &self,
        parent_seq: i64,
        caused_by_seq: i64,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent> {
        self.append(event_name, payload, run_id, Some((parent_seq, caused_by_seq)))
    }
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// Assigns sequence numbers but keeps nothing.
#[derive(Default)]
pub struct NullSink {
    next_seq: AtomicI64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp(
        &self,
        event_name: &str,
        run_id: &str,
        chain: Option<(i64, i64)>,
    ) -> RecordedEvent {
        RecordedEvent {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed) + 1,
            id: Uuid::new_v4(),
            ts: Utc::now(),
            event_name: event_name.to_string(),
            parent_seq: chain.map(|(parent, _)| parent),
            caused_by_seq: chain.map(|(_, root)| root),
            run_id: Some(run_id.to_string()),
            payload: serde_json::Value::Null,
        }
    }
}

impl EventSink for NullSink {
    fn record(
        &self,
        event_name: &str,
        _payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent> {
        Ok(self.stamp(event_name, run_id, None))
    }

    fn record_child(
        &self,
        parent_seq: i64,
        caused_by_seq: i64,
        event_name: &str,
        _payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent> {
        Ok(self.stamp(event_name, run_id, Some((parent_seq, caused_by_seq))))
    }
}

// ---------------------------------------------------------------------------
// Arc<S> blanket, lets callers keep a handle on the sink for inspection
// ---------------------------------------------------------------------------

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn record(
        &self,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent> {
        (**self).record(event_name, payload, run_id)
    }

    fn record_child(
        &self,
        parent_seq: i64,
        caused_by_seq: i64,
        event_name: &str,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedEvent> {
        (**self).record_child(parent_seq, caused_by_seq, event_name, payload, run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_sink_numbers_events_from_one() {
        let sink = MemoryEventSink::new();
        let a = sink.record("a", json!(1), "run").unwrap();
        let b = sink.record("b", json!(2), "run").unwrap();
        assert_eq!((a.seq, b.seq), (1, 2));
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn child_records_parent_and_root() {
        let sink = MemoryEventSink::new();
        let root = sink.record("root", json!(null), "run").unwrap();
        let child = sink
            .record_child(root.seq, root.seq, "child", json!(null), "run")
            .unwrap();
        let grandchild = sink
            .record_child(child.seq, root.seq, "grandchild", json!(null), "run")
            .unwrap();

        assert_eq!(root.caused_by_seq, None);
        assert_eq!(child.parent_seq, Some(root.seq));
        assert_eq!(child.caused_by_seq, Some(root.seq));
        assert_eq!(grandchild.parent_seq, Some(child.seq));
        assert_eq!(grandchild.caused_by_seq, Some(root.seq));
    }

    #[test]
    fn null_sink_keeps_sequence_without_payload() {
        let sink = NullSink::new();
        let a = sink.record("a", json!({"big": true}), "run").unwrap();
        let b = sink.record_child(a.seq, a.seq, "b", json!(null), "run").unwrap();
        assert_eq!(a.seq, 1);
        assert_eq!(b.seq, 2);
        assert_eq!(b.parent_seq, Some(1));
        assert_eq!(b.caused_by_seq, Some(1));
        assert!(a.payload.is_null());
    }
}
