//! Client for the VDK JupyterLab server extension.
//!
//! `request_api` sends a request to an endpoint under the extension's
//! namespace, parses the body as JSON when it is JSON, and turns non-success
//! statuses into `RequestError::Response` carrying the server's message.

pub mod config;
pub mod error;

pub use config::ServerSettings;
pub use error::{RequestError, Result};
pub use reqwest::Method;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// URL namespace of the server extension's handlers.
pub const EXTENSION_NAMESPACE: &str = "vdk-jupyterlab-extension";

/// Method and optional JSON body of a request.
#[derive(Debug, Clone)]
pub struct RequestInit {
    pub method: Method,
    pub body: Option<Value>,
}

impl RequestInit {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            body: None,
        }
    }
}

impl Default for RequestInit {
    fn default() -> Self {
        Self::get()
    }
}

pub struct JupyterClient {
    client: reqwest::Client,
    settings: ServerSettings,
}

impl JupyterClient {
    pub fn new(settings: ServerSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// `base_url/vdk-jupyterlab-extension/endpoint`, with single slashes.
    pub fn request_url(&self, endpoint: &str) -> String {
        let base = self.settings.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_matches('/');
        if endpoint.is_empty() {
            format!("{base}/{EXTENSION_NAMESPACE}")
        } else {
            format!("{base}/{EXTENSION_NAMESPACE}/{endpoint}")
        }
    }

    /// Call an extension endpoint and decode the response as `T`.
    ///
    /// Empty bodies decode from `null`; bodies that are not JSON decode from
    /// the raw text as a JSON string.
    pub async fn request_api<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        init: RequestInit,
    ) -> Result<T> {
        let url = self.request_url(endpoint);

        let mut request = self.client.request(init.method.clone(), &url);
        if let Some(ref token) = self.settings.token {
            request = request.header("Authorization", format!("token {token}"));
        }
        if let Some(body) = init.body {
            request = request.json(&body);
        }

        let resp = request.send().await.map_err(|e| {
            warn!(url = url.as_str(), error = %e, "Request to Jupyter server failed");
            RequestError::from(e)
        })?;

        let status = resp.status();
        let text = resp.text().await?;
        let data = parse_body(&text, &url);

        if !status.is_success() {
            let message = error_message(&data);
            warn!(
                url = url.as_str(),
                status = status.as_u16(),
                message = message.as_str(),
                "Jupyter server returned an error"
            );
            return Err(RequestError::Response {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_value(data)?)
    }
}

fn parse_body(text: &str, url: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| {
        debug!(url, "Not a JSON response body");
        Value::String(text.to_string())
    })
}

/// The body's `message` field when it is a non-empty string, else the body.
fn error_message(data: &Value) -> String {
    match data.get("message") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        _ => match data {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        },
    }
}
