//! Error types for PulseAI.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Classification oracle errors.
///
/// Covers every way the oracle call can fail: transport, timeout, and a
/// response body that cannot be read as the expected JSON candidate. The
/// pipeline treats all variants identically (fallback reply, no retry),
/// so the distinctions exist for logging.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Unavailable(String),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Downstream dispatch errors (reply, ticket, agency alert).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to send reply to {to}: {reason}")]
    ReplyFailed { to: String, reason: String },

    #[error("Ticket creation failed: {0}")]
    TicketFailed(String),

    #[error("Agency notification failed for {agency}: {reason}")]
    NotifyFailed { agency: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
