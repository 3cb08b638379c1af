//! Handler registration: what ends up in the metadata store.

use anyhow::Result;
use serde_json::{json, Value};
use vdk_engine::{
    handlers_for, system_event_handler, MetadataStore, Predicate, SystemEvent,
    SystemEventFilterExpression, SystemEventHandlers, SYSTEM_EVENT_HANDLER_METADATA_KEY,
};

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DataJobsPanel;

impl DataJobsPanel {
    fn on_e1(&mut self, _event: &SystemEvent<Value>) -> Result<Vec<SystemEvent<Value>>> {
        Ok(vec![])
    }

    fn on_e2(&mut self, _event: &SystemEvent<Value>) -> Result<Vec<SystemEvent<Value>>> {
        Ok(vec![])
    }
}

impl SystemEventHandlers for DataJobsPanel {
    type Payload = Value;

    fn register_handlers(store: &mut MetadataStore) {
        system_event_handler!(store, DataJobsPanel, "E1", None, on_e1);
        system_event_handler!(store, DataJobsPanel, "E2", None, on_e2);
    }
}

#[derive(Default)]
struct ExecutionsGrid;

impl ExecutionsGrid {
    fn on_e1(&mut self, _event: &SystemEvent<String>) -> Result<Vec<SystemEvent<String>>> {
        Ok(vec![])
    }
}

impl SystemEventHandlers for ExecutionsGrid {
    type Payload = String;

    fn register_handlers(store: &mut MetadataStore) {
        let filter = SystemEventFilterExpression::from(Predicate::equal("failed".to_string()));
        system_event_handler!(store, ExecutionsGrid, "E1", Some(filter), on_e1);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn nothing_registered_yields_empty_list() {
    let store = MetadataStore::new();
    assert!(handlers_for::<DataJobsPanel>(&store).is_empty());
    assert!(store.is_empty());
}

#[test]
fn single_registration_yields_one_entry() {
    let mut store = MetadataStore::new();
    system_event_handler!(&mut store, DataJobsPanel, "E1", None, on_e1);

    let entries = handlers_for::<DataJobsPanel>(&store);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].handler.name(), "on_e1");
    assert_eq!(entries[0].events, "E1");
    assert!(entries[0].filter_expression.is_none());
}

#[test]
fn second_registration_appends_in_order() {
    let store = MetadataStore::new().with_handlers::<DataJobsPanel>();

    let entries = handlers_for::<DataJobsPanel>(&store);
    let summary: Vec<_> = entries
        .iter()
        .map(|e| (e.handler.name(), e.events.as_str(), e.filter_expression.is_some()))
        .collect();
    assert_eq!(summary, vec![("on_e1", "E1", false), ("on_e2", "E2", false)]);
}

#[test]
fn duplicate_registrations_are_kept() {
    let mut store = MetadataStore::new();
    system_event_handler!(&mut store, DataJobsPanel, "E1", None, on_e1);
    system_event_handler!(&mut store, DataJobsPanel, "E1", None, on_e1);

    let entries = handlers_for::<DataJobsPanel>(&store);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.events == "E1" && e.handler.name() == "on_e1"));
}

#[test]
fn distinct_types_keep_independent_lists() {
    let mut store = MetadataStore::new().with_handlers::<ExecutionsGrid>();
    assert!(handlers_for::<DataJobsPanel>(&store).is_empty());

    DataJobsPanel::register_handlers(&mut store);

    assert_eq!(handlers_for::<DataJobsPanel>(&store).len(), 2);
    let grid = handlers_for::<ExecutionsGrid>(&store);
    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0].events, "E1");
}

#[test]
fn filter_is_stored_with_the_entry() {
    let store = MetadataStore::new().with_handlers::<ExecutionsGrid>();
    let entry = &handlers_for::<ExecutionsGrid>(&store)[0];

    let filter = entry.filter_expression.as_ref().unwrap();
    assert_eq!(filter.predicates(), &[Predicate::equal("failed".to_string())]);
    assert!(entry.accepts(&SystemEvent::new("E1", "failed".to_string())));
    assert!(!entry.accepts(&SystemEvent::new("E1", "succeeded".to_string())));
    assert!(!entry.accepts(&SystemEvent::new("E2", "failed".to_string())));
}

#[test]
fn handler_list_lives_under_the_fixed_metadata_key() {
    let store = MetadataStore::new().with_handlers::<DataJobsPanel>();
    assert!(store.contains(
        std::any::TypeId::of::<DataJobsPanel>(),
        SYSTEM_EVENT_HANDLER_METADATA_KEY
    ));
    assert_eq!(SYSTEM_EVENT_HANDLER_METADATA_KEY, "SystemEventHandler");
}

#[test]
fn defining_the_handler_key_does_not_clobber_registrations() {
    let target = std::any::TypeId::of::<DataJobsPanel>();
    let mut store = MetadataStore::new();
    system_event_handler!(&mut store, DataJobsPanel, "E1", None, on_e1);

    store.define(target, SYSTEM_EVENT_HANDLER_METADATA_KEY, 5u8);
    system_event_handler!(&mut store, DataJobsPanel, "E2", None, on_e2);

    let events: Vec<_> = handlers_for::<DataJobsPanel>(&store)
        .iter()
        .map(|e| e.events.as_str())
        .collect();
    assert_eq!(events, vec!["E1", "E2"]);
    assert!(store.get::<u8>(target, SYSTEM_EVENT_HANDLER_METADATA_KEY).is_none());
}

#[test]
fn entry_matches_by_event_name() {
    let store = MetadataStore::new().with_handlers::<DataJobsPanel>();
    let entry = &handlers_for::<DataJobsPanel>(&store)[0];
    assert!(entry.handles("E1"));
    assert!(!entry.handles("E2"));
    assert!(entry.accepts(&SystemEvent::new("E1", json!({"any": "payload"}))));
}

#[test]
fn registered_handler_can_be_called() {
    let store = MetadataStore::new().with_handlers::<DataJobsPanel>();
    let entry = &handlers_for::<DataJobsPanel>(&store)[1];

    let mut panel = DataJobsPanel;
    let emitted = entry
        .handler
        .call(&mut panel, &SystemEvent::new("E2", json!({})))
        .unwrap();
    assert!(emitted.is_empty());
}
