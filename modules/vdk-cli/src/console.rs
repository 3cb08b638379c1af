//! A dispatch target whose handlers are declared in a handlers file.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde_json::Value;
use tracing::info;
use vdk_engine::{system_event_handler, MetadataStore, SystemEvent, SystemEventHandlers};

use crate::config::{Action, HandlersFile};

type Event = SystemEvent<Value>;

/// Logs, counts, or answers system events with follow-up events.
#[derive(Debug, Default)]
pub struct Console {
    followups: HashMap<String, Vec<Event>>,
    pub logged: Vec<String>,
    pub counts: BTreeMap<String, u64>,
}

impl Console {
    pub fn new(file: &HandlersFile) -> Self {
        let followups = file
            .emit
            .iter()
            .map(|(trigger, decls)| {
                let events = decls
                    .iter()
                    .map(|d| SystemEvent::new(d.name.clone(), d.payload.clone()))
                    .collect();
                (trigger.clone(), events)
            })
            .collect();

        Self {
            followups,
            ..Self::default()
        }
    }

    fn log_event(&mut self, event: &Event) -> Result<Vec<Event>> {
        info!(event = event.name.as_str(), payload = %event.payload, "System event");
        self.logged.push(event.name.clone());
        Ok(vec![])
    }

    fn count_event(&mut self, event: &Event) -> Result<Vec<Event>> {
        *self.counts.entry(event.name.clone()).or_default() += 1;
        Ok(vec![])
    }

    fn emit_followups(&mut self, event: &Event) -> Result<Vec<Event>> {
        Ok(self.followups.get(&event.name).cloned().unwrap_or_default())
    }
}

impl SystemEventHandlers for Console {
    type Payload = Value;

    /// No built-in handlers: everything comes from the handlers file through
    /// [`register_declared`].
    fn register_handlers(_store: &mut MetadataStore) {}
}

/// Register one handler per declaration, in file order.
pub fn register_declared(store: &mut MetadataStore, file: &HandlersFile) {
    for decl in &file.handlers {
        let event = decl.event.clone();
        let filter = decl.filter.clone();
        match decl.action {
            Action::Log => system_event_handler!(store, Console, event, filter, log_event),
            Action::Count => system_event_handler!(store, Console, event, filter, count_event),
            Action::Emit => system_event_handler!(store, Console, event, filter, emit_followups),
        }
    }
}
