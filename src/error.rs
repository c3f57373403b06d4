//! Error types for the library layers.
//!
//! Store operations never surface these to callers; they are logged and
//! recovered from. The assistant uses them internally to decide when to fall
//! back to canned responses.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reading or writing the durable state slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure talking to the generative-language API.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("failed to send request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}
