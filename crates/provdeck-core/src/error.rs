// ── Core error types ──
//
// User-facing errors from provdeck-core. These are NOT API-specific --
// consumers never see raw HTTP plumbing. Note that a failed save does
// not surface here at all: it lands on the row that started it, as the
// draft's error banner. `CoreError` covers what goes wrong *before* a
// request is in flight, plus bootstrap and configuration failures.
// The `From<provdeck_api::Error>` impl translates transport-layer
// errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Row addressing ───────────────────────────────────────────────
    #[error("No {noun} at row {index}")]
    RowNotFound { noun: &'static str, index: usize },

    #[error("The {noun} at row {index} already has a request in flight")]
    RowBusy { noun: &'static str, index: usize },

    // ── Field edits ──────────────────────────────────────────────────
    #[error("No editable {noun} field named {field:?}")]
    NotEditable { noun: &'static str, field: String },

    #[error("The {field} of a saved {noun} cannot change")]
    KeyLocked { noun: &'static str, field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    // ── Server round trips ───────────────────────────────────────────
    #[error("Cannot reach the provisioning server: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("The server rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<provdeck_api::Error> for CoreError {
    fn from(err: provdeck_api::Error) -> Self {
        match err {
            provdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            }
            provdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            provdeck_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            provdeck_api::Error::Api { status, messages } => CoreError::Rejected {
                status,
                message: messages.join(", "),
            },
            provdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
