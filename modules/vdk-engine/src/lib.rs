//! System event handler registry and dispatch engine.
//!
//! Target types declare which methods react to which named system events by
//! registering them in a `MetadataStore` (see `SystemEventHandlers`). The
//! `Engine` reads a type's handler list and dispatches: record → match name →
//! evaluate filter → invoke → recurse on emitted events until settled.

pub mod engine;
pub mod error;
pub mod persist;
pub mod registry;
pub mod traits;

pub use engine::{DispatchReport, Engine, EngineConfig};
pub use error::{EngineError, Result};
pub use persist::{MemoryEventSink, NullSink};
pub use registry::{
    handlers_for, register_system_event_handler, HandlerEntry, HandlerFn, HandlerRef,
    MetadataStore, SYSTEM_EVENT_HANDLER_METADATA_KEY,
};
pub use traits::{EventSink, RecordedEvent, SystemEvent, SystemEventHandlers};

pub use vdk_filter::{Expression, Predicate, SystemEventFilterExpression};
