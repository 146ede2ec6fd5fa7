//! Navigation errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while resolving routes, refreshing permissions or talking to the desk server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// Missing or empty name passed where a slug is required.
    #[error("invalid argument: {0}")]
    InvalidArgument(SmolStr),

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(SmolStr),

    /// Network or I/O failure before a response was received.
    #[error("transport error: {0}")]
    Transport(SmolStr),

    /// Server answered with a non-success status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: SmolStr },

    /// Session is not authenticated (or no longer is).
    #[error("authentication required: {0}")]
    Authentication(SmolStr),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(SmolStr),
}

impl NavError {
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}
