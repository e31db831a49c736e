//! Error types for the gateway client.

use thiserror::Error;

/// Result type for gateway calls.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Gateway URL or subscription key not configured
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The gateway answered with its error envelope
    #[error("Gateway error ({status}): {error}: {details}")]
    Gateway {
        status: u16,
        error: String,
        details: String,
    },

    /// Non-success status without a readable envelope
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}
