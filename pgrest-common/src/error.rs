//! Error types for the PostgREST data provider

use thiserror::Error;

/// Provider error types
#[derive(Error, Debug)]
pub enum Error {
    // Response Errors
    #[error(
        "The Content-Range header is missing in the HTTP response. List responses must carry it \
         with the total number of results to build the pagination. If you are using CORS, \
         declare Content-Range in the Access-Control-Expose-Headers header"
    )]
    MissingRangeHeader,

    #[error("Invalid Content-Range header: {0}")]
    InvalidRangeHeader(String),

    #[error("Unexpected response body: {0}")]
    UnexpectedResponse(String),

    // Identifier Errors
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    // Query Errors
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    // Transport Errors
    #[error("Transport failure{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    // General Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a transport failure from an HTTP status and message
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// HTTP status reported by the transport, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable error code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRangeHeader => "missing_range_header",
            Self::InvalidRangeHeader(_) => "invalid_range_header",
            Self::UnexpectedResponse(_) => "unexpected_response",
            Self::MalformedIdentifier(_) => "malformed_identifier",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::InvalidQueryParam(_) => "invalid_param",
            Self::Transport { .. } => "transport_failure",
            Self::ConfigError(_) => "config_error",
            Self::IoError(_) => "io_error",
            Self::JsonError(_) => "json_error",
        }
    }
}
