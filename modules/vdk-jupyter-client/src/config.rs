use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888/";

/// Where the Jupyter server lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub base_url: String,
    pub token: Option<String>,
}

impl ServerSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Load from `JUPYTER_BASE_URL` and `JUPYTER_TOKEN`, reading `.env` first.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from a variable lookup. An empty token counts as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup("JUPYTER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: lookup("JUPYTER_TOKEN").filter(|t| !t.is_empty()),
        }
    }

    pub fn log_redacted(&self) {
        tracing::info!(
            base_url = self.base_url.as_str(),
            token = redact(self.token.as_deref()).as_str(),
            "Jupyter server settings loaded"
        );
    }
}

/// First four characters and the length; never the whole secret.
pub fn redact(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => {
            format!("{}...({} chars)", s.chars().take(4).collect::<String>(), s.len())
        }
        _ => "<not set>".to_string(),
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
