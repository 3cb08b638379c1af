use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequestError>;

#[derive(Debug, Error)]
pub enum RequestError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Server error (status {status}): {message}")]
    Response { status: u16, message: String },

    /// The response body did not match the expected type.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Network(err.to_string())
    }
}
