use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A handler returned an error. Dispatch stops at the first failure.
    #[error("handler `{handler}` failed on event `{event}`: {source}")]
    Handler {
        handler: &'static str,
        event: String,
        #[source]
        source: anyhow::Error,
    },

    /// Handlers kept emitting events past the configured limit.
    #[error("dispatch exceeded {limit} events")]
    EventBudgetExceeded { limit: usize },

    #[error("event sink error: {0}")]
    Sink(String),

    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}
