use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use vdk_engine::SystemEventFilterExpression;

/// Handler declarations loaded from a TOML file.
///
/// ```toml
/// [engine]
/// max_events = 64
///
/// [[handler]]
/// event = "job-deployed"
/// action = "emit"
/// filter = [{ op = "equal", value = { job = "orders" } }]
///
/// [[emit.job-deployed]]
/// name = "job-refresh"
/// payload = { job = "orders" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlersFile {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default, rename = "handler")]
    pub handlers: Vec<HandlerDecl>,
    /// Follow-up events emitted by `emit` handlers, keyed by trigger event name.
    #[serde(default)]
    pub emit: HashMap<String, Vec<EmitDecl>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    pub max_events: Option<NonZeroUsize>,
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerDecl {
    pub event: String,
    pub action: Action,
    #[serde(default)]
    pub filter: Option<SystemEventFilterExpression<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Log,
    Count,
    Emit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitDecl {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

pub fn load_handlers(path: &Path) -> Result<HandlersFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read handlers file: {}", path.display()))?;
    parse_handlers(&content)
        .with_context(|| format!("Failed to parse handlers file: {}", path.display()))
}

pub fn parse_handlers(content: &str) -> Result<HandlersFile> {
    Ok(toml::from_str(content)?)
}
