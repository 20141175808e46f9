//! Error types for the order notifier.

use std::time::Duration;

/// Top-level error type for one invocation.
///
/// Startup problems are [`ConfigError`]s and never reach an invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    /// Short classifier used in logs and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Render(_) => "render",
            Self::Transport(_) => "transport",
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Incomplete SMTP credentials: {0} is set without its counterpart")]
    IncompleteCredentials(&'static str),
}

/// The inbound payload lacks a field strict ingestion requires.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Event carries no data payload")]
    MissingData,

    #[error("Event data is not a JSON object")]
    NotAnObject,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// A field the renderer needs is absent or malformed.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("No order payload to render")]
    MissingPayload,

    #[error("Invalid order payload: {0}")]
    InvalidOrder(#[from] serde_json::Error),
}

/// The mail transport did not accept the message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport {transport} rejected the message: {reason}")]
    Rejected { transport: String, reason: String },

    #[error("Transport {transport} timed out after {timeout:?}")]
    Timeout { transport: String, timeout: Duration },

    #[error("Transport {transport} unreachable: {reason}")]
    Unreachable { transport: String, reason: String },

    #[error("Could not build message: {0}")]
    InvalidMessage(String),

    #[error("Send aborted on transport {transport}: {reason}")]
    Aborted { transport: String, reason: String },
}
