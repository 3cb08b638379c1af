use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vdk_engine::{Engine, EngineConfig, MemoryEventSink, MetadataStore, SystemEvent};
use vdk_jupyter_client::{JupyterClient, Method, RequestInit, ServerSettings};

mod config;
mod console;

use console::Console;

#[derive(Parser)]
#[command(
    name = "vdk-events",
    about = "Dispatch VDK system events and call the Jupyter extension"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish events to the handlers declared in a handlers file
    Dispatch {
        #[arg(long, default_value = "handlers.toml")]
        config: PathBuf,
        /// Event as NAME or NAME=JSON_PAYLOAD (repeatable)
        #[arg(long = "event", required = true, value_parser = parse_event)]
        events: Vec<SystemEvent<Value>>,
        /// Events a single dispatch may process (at least 1)
        #[arg(long)]
        max_events: Option<NonZeroUsize>,
        /// Print dispatch reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Call an endpoint of the VDK JupyterLab server extension
    Request {
        endpoint: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vdk=info".parse()?))
        .init();

    match Cli::parse().command {
        Command::Dispatch {
            config,
            events,
            max_events,
            json,
        } => dispatch(&config, events, max_events, json),
        Command::Request {
            endpoint,
            method,
            body,
        } => request(&endpoint, &method, body.as_deref()).await,
    }
}

fn dispatch(
    path: &std::path::Path,
    events: Vec<SystemEvent<Value>>,
    max_events: Option<NonZeroUsize>,
    json: bool,
) -> Result<()> {
    let file = config::load_handlers(path)?;

    let mut store = MetadataStore::new();
    console::register_declared(&mut store, &file);

    let mut engine_config = EngineConfig::default();
    if let Some(max) = max_events.or(file.engine.max_events) {
        engine_config.max_events = max.get();
    }
    let run_id = file
        .engine
        .run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let engine = Engine::<Console, _>::new(&store, MemoryEventSink::new(), run_id)
        .with_config(engine_config);
    info!(
        handlers = engine.handler_count(),
        run_id = engine.run_id(),
        "VDK event dispatcher ready"
    );

    let mut console = Console::new(&file);
    for event in events {
        let name = event.name.clone();
        let report = engine
            .dispatch(&mut console, event)
            .with_context(|| format!("Dispatch of `{name}` failed"))?;

        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!(
                "{name}: {} events, {} handlers invoked, {} filtered",
                report.events_processed, report.handlers_invoked, report.handlers_filtered
            );
        }
    }

    for (event, count) in &console.counts {
        println!("count {event} = {count}");
    }
    Ok(())
}

async fn request(endpoint: &str, method: &str, body: Option<&str>) -> Result<()> {
    let settings = ServerSettings::from_env();
    settings.log_redacted();

    let body = body
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--body must be valid JSON")?;
    let init = RequestInit {
        method: parse_method(method)?,
        body,
    };

    let client = JupyterClient::new(settings)?;
    let response: Value = client.request_api(endpoint, init).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn parse_event(raw: &str) -> std::result::Result<SystemEvent<Value>, String> {
    match raw.split_once('=') {
        None => Ok(SystemEvent::new(raw, Value::Null)),
        Some((name, payload)) => {
            let payload = serde_json::from_str(payload)
                .map_err(|e| format!("invalid JSON payload for `{name}`: {e}"))?;
            Ok(SystemEvent::new(name, payload))
        }
    }
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid HTTP method: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_event_with_and_without_payload() {
        let bare = parse_event("job-deleted").unwrap();
        assert_eq!(bare.name, "job-deleted");
        assert!(bare.payload.is_null());

        let full = parse_event(r#"job-deployed={"job":"orders"}"#).unwrap();
        assert_eq!(full.name, "job-deployed");
        assert_eq!(full.payload, json!({"job": "orders"}));

        assert!(parse_event("job-deployed={not json").is_err());
    }

    #[test]
    fn cli_parses_repeated_events() {
        let cli = Cli::try_parse_from([
            "vdk-events",
            "dispatch",
            "--config",
            "h.toml",
            "--event",
            "a",
            "--event",
            "b=1",
        ])
        .unwrap();
        match cli.command {
            Command::Dispatch { events, .. } => {
                assert_eq!(events.len(), 2);
                assert_eq!(events[1].payload, json!(1));
            }
            Command::Request { .. } => panic!("expected dispatch"),
        }
    }

    #[test]
    fn zero_max_events_is_rejected() {
        let parsed = Cli::try_parse_from([
            "vdk-events",
            "dispatch",
            "--event",
            "a",
            "--max-events",
            "0",
        ]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "vdk-events",
            "dispatch",
            "--event",
            "a",
            "--max-events",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Dispatch { max_events, .. } => {
                assert_eq!(max_events.map(NonZeroUsize::get), Some(3));
            }
            Command::Request { .. } => panic!("expected dispatch"),
        }
    }

    #[test]
    fn http_methods_are_case_insensitive() {
        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert_eq!(parse_method("Delete").unwrap(), Method::DELETE);
    }
}
