//! Error type shared by the message codec and the REST client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClashError {
    // Channel messages
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message has no \"type\" field")]
    MissingKind,

    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: String,
        source: serde_json::Error,
    },

    #[error("unknown player field: {0}")]
    UnknownField(String),

    // REST
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("unexpected response body: {0}")]
    Body(String),
}
