//! Handler metadata: which methods of a type react to which system events.
//!
//! Metadata lives in an explicitly constructed [`MetadataStore`] keyed by the
//! target type and a metadata key. Handler lists are append-only: each
//! registration adds exactly one entry, in call order, with no de-duplication.
//! Two entries for the same event name both fire.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};
use vdk_filter::SystemEventFilterExpression;

use crate::traits::{SystemEvent, SystemEventHandlers};

/// Metadata key under which handler lists are stored.
pub const SYSTEM_EVENT_HANDLER_METADATA_KEY: &str = "SystemEventHandler";

/// A handler method. Returns events to dispatch next (usually none).
pub type HandlerFn<T> = fn(
    &mut T,
    &SystemEvent<<T as SystemEventHandlers>::Payload>,
) -> anyhow::Result<Vec<SystemEvent<<T as SystemEventHandlers>::Payload>>>;

/// A named reference to a handler method.
pub struct HandlerRef<T: SystemEventHandlers> {
    name: &'static str,
    func: HandlerFn<T>,
}

impl<T: SystemEventHandlers> HandlerRef<T> {
    pub fn new(name: &'static str, func: HandlerFn<T>) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(
        &self,
        target: &mut T,
        event: &SystemEvent<T::Payload>,
    ) -> anyhow::Result<Vec<SystemEvent<T::Payload>>> {
        (self.func)(target, event)
    }
}

impl<T: SystemEventHandlers> Clone for HandlerRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: SystemEventHandlers> Copy for HandlerRef<T> {}

impl<T: SystemEventHandlers> fmt::Debug for HandlerRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.name).finish()
    }
}

/// One registration: a handler, the event name it reacts to, and an optional
/// filter over the event payload.
pub struct HandlerEntry<T: SystemEventHandlers> {
    pub handler: HandlerRef<T>,
    pub events: String,
    pub filter_expression: Option<SystemEventFilterExpression<T::Payload>>,
}

impl<T: SystemEventHandlers> HandlerEntry<T> {
    /// Whether this entry should run for `event`: the name matches and the
    /// filter, if any, passes on the payload.
    pub fn accepts(&self, event: &SystemEvent<T::Payload>) -> bool
    where
        T::Payload: PartialEq,
    {
        self.handles(&event.name) && self.passes_filter(&event.payload)
    }

    pub fn handles(&self, event_name: &str) -> bool {
        self.events == event_name
    }

    pub fn passes_filter(&self, payload: &T::Payload) -> bool
    where
        T::Payload: PartialEq,
    {
        self.filter_expression
            .as_ref()
            .map_or(true, |filter| filter.evaluate(payload))
    }
}

impl<T: SystemEventHandlers> Clone for HandlerEntry<T>
where
    T::Payload: Clone,
{
    fn clone(&self) -> Self {
        Self {
            handler: self.handler,
            events: self.events.clone(),
            filter_expression: self.filter_expression.clone(),
        }
    }
}

impl<T: SystemEventHandlers> fmt::Debug for HandlerEntry<T>
where
    T::Payload: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("handler", &self.handler)
            .field("events", &self.events)
            .field("filter_expression", &self.filter_expression)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// MetadataStore
// ---------------------------------------------------------------------------

/// Associative store of metadata keyed by (target type, key).
///
/// Built during application initialization and handed to the dispatcher.
/// Mutation needs `&mut`, so nothing can register while an `Engine` borrows it.
#[derive(Default)]
pub struct MetadataStore {
    entries: HashMap<(TypeId, &'static str), Box<dyn Any + Send + Sync>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store with the handlers of `T` already registered.
    pub fn with_handlers<T: SystemEventHandlers>(mut self) -> Self {
        T::register_handlers(&mut self);
        self
    }

    pub fn get<V: Any>(&self, target: TypeId, key: &'static str) -> Option<&V> {
        self.entries.get(&(target, key))?.downcast_ref::<V>()
    }

    pub fn get_mut<V: Any>(&mut self, target: TypeId, key: &'static str) -> Option<&mut V> {
        self.entries.get_mut(&(target, key))?.downcast_mut::<V>()
    }

    /// Store `value` under (target, key), replacing whatever was there.
    ///
    /// [`SYSTEM_EVENT_HANDLER_METADATA_KEY`] is reserved for handler lists and
    /// is only written by [`register_system_event_handler`]; defining it is
    /// refused and leaves the registered handlers intact.
    pub fn define<V: Any + Send + Sync>(&mut self, target: TypeId, key: &'static str, value: V) {
        if key == SYSTEM_EVENT_HANDLER_METADATA_KEY {
            warn!(key, "Refusing to overwrite reserved handler metadata");
            return;
        }
        self.insert(target, key, value);
    }

    fn insert<V: Any + Send + Sync>(&mut self, target: TypeId, key: &'static str, value: V) {
        self.entries.insert((target, key), Box::new(value));
    }

    pub fn contains(&self, target: TypeId, key: &'static str) -> bool {
        self.entries.contains_key(&(target, key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Append a handler for the system event `events` to `T`'s handler list,
/// creating the list on first use.
pub fn register_system_event_handler<T: SystemEventHandlers>(
    store: &mut MetadataStore,
    events: impl Into<String>,
    filter_expression: Option<SystemEventFilterExpression<T::Payload>>,
    handler: HandlerRef<T>,
) {
    let target = TypeId::of::<T>();
    let entry = HandlerEntry {
        handler,
        events: events.into(),
        filter_expression,
    };

    debug!(
        target_type = type_name::<T>(),
        handler = handler.name(),
        events = entry.events.as_str(),
        filtered = entry.filter_expression.is_some(),
        "Registering system event handler"
    );

    // Only registration writes under the handler key, so a failed downcast
    // means the slot is empty.
    match store.get_mut::<Vec<HandlerEntry<T>>>(target, SYSTEM_EVENT_HANDLER_METADATA_KEY) {
        Some(list) => list.push(entry),
        None => store.insert(target, SYSTEM_EVENT_HANDLER_METADATA_KEY, vec![entry]),
    }
}

/// `T`'s registered handlers in registration order. Empty if none.
pub fn handlers_for<T: SystemEventHandlers>(store: &MetadataStore) -> &[HandlerEntry<T>] {
    store
        .get::<Vec<HandlerEntry<T>>>(TypeId::of::<T>(), SYSTEM_EVENT_HANDLER_METADATA_KEY)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Register a method of `$target` as a handler for a named system event.
///
/// ```ignore
/// system_event_handler!(store, JobsPanel, "job-deployed", None, on_job_deployed);
/// ```
#[macro_export]
macro_rules! system_event_handler {
    ($store:expr, $target:ty, $event:expr, $filter:expr, $method:ident) => {
        $crate::registry::register_system_event_handler::<$target>(
            $store,
            $event,
            $filter,
            $crate::registry::HandlerRef::new(stringify!($method), <$target>::$method),
        )
    };
}
