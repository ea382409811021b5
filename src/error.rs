//! Error types for memline
//!
//! Provides a unified error type for all session operations.
//!
//! Negative server outcomes (`NOT_FOUND`, `NOT_STORED`, `EXISTS`) are not
//! errors: they come back as `Ok(false)` / `Ok(None)` from the session.

use thiserror::Error;

/// Result type alias using MemcacheError
pub type Result<T> = std::result::Result<T, MemcacheError>;

/// Unified error type for memline operations
#[derive(Debug, Error)]
pub enum MemcacheError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection failure: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Session is closed")]
    SessionClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MemcacheError {
    /// True for transport failures and for use of a closed session
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, MemcacheError::Connection(_) | MemcacheError::SessionClosed)
    }

    /// True when a reply did not match the grammar of the issued command
    pub fn is_protocol_fault(&self) -> bool {
        matches!(self, MemcacheError::Protocol(_))
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        MemcacheError::Protocol(message.into())
    }
}
