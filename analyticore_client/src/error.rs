use thiserror::Error;

/// Failures talking to the gateway or setting up an HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("url cannot be used as a base: {0}")]
    UnsupportedUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("gateway returned status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        job_id: Option<String>,
    },

    #[error("invalid response: {0}")]
    Decode(String),
}
