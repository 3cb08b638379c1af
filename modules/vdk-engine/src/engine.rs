//! The dispatch loop.

use std::any::type_name;
use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::registry::{handlers_for, HandlerEntry, MetadataStore};
use crate::traits::{EventSink, SystemEvent, SystemEventHandlers};

pub const DEFAULT_MAX_EVENTS: usize = 1024;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on events processed by a single `dispatch` call, counting
    /// the published event and everything its handlers emit.
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

/// What a `dispatch` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub events_processed: usize,
    pub handlers_invoked: usize,
    /// Handlers whose event name matched but whose filter rejected the payload.
    pub handlers_filtered: usize,
    /// Names of invoked handlers, in invocation order.
    pub invoked: Vec<&'static str>,
}

/// Dispatches system events to the registered handlers of `T`.
///
/// Record → match → filter → invoke → recurse until settled. Events emitted
/// by handlers are processed breadth-first and recorded as children of the
/// event whose handler emitted them.
pub struct Engine<'a, T: SystemEventHandlers, S: EventSink> {
    handlers: &'a [HandlerEntry<T>],
    sink: S,
    run_id: String,
    config: EngineConfig,
}

impl<'a, T, S> Engine<'a, T, S>
where
    T: SystemEventHandlers,
    T::Payload: PartialEq + Serialize,
    S: EventSink,
{
    pub fn new(store: &'a MetadataStore, sink: S, run_id: impl Into<String>) -> Self {
        Self {
            handlers: handlers_for::<T>(store),
            sink,
            run_id: run_id.into(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish `event` to `target`. Stops at the first handler error.
    pub fn dispatch(
        &self,
        target: &mut T,
        event: SystemEvent<T::Payload>,
    ) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();
        // (event, Some((parent_seq, root_seq))) for handler-emitted events
        let mut queue: VecDeque<(SystemEvent<T::Payload>, Option<(i64, i64)>)> = VecDeque::new();
        queue.push_back((event, None));

        while let Some((evt, chain)) = queue.pop_front() {
            if report.events_processed >= self.config.max_events {
                return Err(EngineError::EventBudgetExceeded {
                    limit: self.config.max_events,
                });
            }

            // 1. Record with causal chain
            let payload = serde_json::to_value(&evt.payload)?;
            let (recorded, root_seq) = match chain {
                None => {
                    let recorded = self.sink.record(&evt.name, payload, &self.run_id)?;
                    let root = recorded.seq;
                    (recorded, root)
                }
                Some((parent, root)) => (
                    self.sink
                        .record_child(parent, root, &evt.name, payload, &self.run_id)?,
                    root,
                ),
            };
            report.events_processed += 1;

            // 2. Matching handlers, in registration order
            for entry in self.handlers.iter().filter(|e| e.handles(&evt.name)) {
                if !entry.passes_filter(&evt.payload) {
                    debug!(
                        handler = entry.handler.name(),
                        event = evt.name.as_str(),
                        "Filter rejected payload, skipping handler"
                    );
                    report.handlers_filtered += 1;
                    continue;
                }

                let children =
                    entry
                        .handler
                        .call(target, &evt)
                        .map_err(|source| EngineError::Handler {
                            handler: entry.handler.name(),
                            event: evt.name.clone(),
                            source,
                        })?;
                report.handlers_invoked += 1;
                report.invoked.push(entry.handler.name());

                // 3. Enqueue children (chained off this event)
                for child in children {
                    queue.push_back((child, Some((recorded.seq, root_seq))));
                }
            }
        }

        info!(
            target_type = type_name::<T>(),
            run_id = self.run_id.as_str(),
            events = report.events_processed,
            invoked = report.handlers_invoked,
            filtered = report.handlers_filtered,
            "Dispatch settled"
        );

        Ok(report)
    }

    /// Number of handlers registered for `T`.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
