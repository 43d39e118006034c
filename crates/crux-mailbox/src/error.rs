//! Transport error types.

use thiserror::Error;

/// Maximum number of raw payload characters carried in an error message.
const PAYLOAD_LIMIT: usize = 256;

/// A failed mailbox call. One variant per distinct failure kind; each
/// message starts with a stable prefix identifying the kind and carries a
/// truncated copy of the offending payload for diagnostics. Nothing here
/// is retried at this layer — retries belong to the caller.
#[derive(Error, Debug, Clone)]
pub enum MailboxError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error: status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not valid JSON.
    #[error("Invalid JSON response: {detail}: {payload}")]
    InvalidJson { detail: String, payload: String },

    /// The response parsed, but is not a JSON object envelope.
    #[error("Response is not a JSON object: {payload}")]
    NotAnObject { payload: String },

    /// The envelope carried an `error` field from the remote side.
    #[error("Remote error: {message}")]
    Remote { message: String },

    /// The event stream ended without a single parseable envelope.
    #[error("Event stream exhausted without an envelope: {payload}")]
    StreamExhausted { payload: String },
}

impl MailboxError {
    /// Creates an InvalidJson error with a truncated payload.
    pub fn invalid_json(detail: impl Into<String>, payload: &str) -> Self {
        Self::InvalidJson {
            detail: detail.into(),
            payload: truncate_payload(payload),
        }
    }

    /// Creates a NotAnObject error with a truncated payload.
    pub fn not_an_object(payload: &str) -> Self {
        Self::NotAnObject {
            payload: truncate_payload(payload),
        }
    }

    /// Creates a StreamExhausted error with a truncated payload.
    pub fn stream_exhausted(payload: &str) -> Self {
        Self::StreamExhausted {
            payload: truncate_payload(payload),
        }
    }

    /// Creates a Status error with a truncated body.
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate_payload(body),
        }
    }

    /// Check if the remote side reported the error (as opposed to a
    /// transport-level failure).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Check if this is a network-level failure.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Clips a raw payload for inclusion in an error message.
pub(crate) fn truncate_payload(payload: &str) -> String {
    if payload.chars().count() <= PAYLOAD_LIMIT {
        payload.to_string()
    } else {
        let clipped: String = payload.chars().take(PAYLOAD_LIMIT).collect();
        format!("{clipped}... (truncated)")
    }
}

/// A type alias for `Result<T, MailboxError>`.
pub type Result<T> = std::result::Result<T, MailboxError>;
