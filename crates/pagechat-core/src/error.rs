//! Error types for PageChat.
//!
//! `Config`, `Validation` and `Api` carry messages meant for the user and
//! display them without a prefix.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{0}")]
    Busy(String),

    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than the remote side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Validation(_) | Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
