//! Error types for blobstream.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("range {offset}+{length} failed with HTTP status {status}")]
    Status { status: u16, offset: u64, length: u64 },

    #[error("range {offset}+{length} failed: {message}")]
    Transport {
        offset:  u64,
        length:  u64,
        message: String,
    },

    #[error("range {offset}+{length} was answered with the whole object")]
    RangeIgnored { offset: u64, length: u64 },

    #[error("credential provider failed: {0}")]
    Credential(String),

    #[error("range {offset}+{length} timed out")]
    Timeout { offset: u64, length: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the failure means the object does not exist.
    pub fn is_not_found(&self) -> bool { matches!(self, Error::NotFound { .. }) }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = if e.is_not_found() { io::ErrorKind::NotFound } else { io::ErrorKind::Other };
        io::Error::new(kind, e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
