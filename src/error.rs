//! Error types for stream-bridge
//!
//! Connectivity failures are deliberately not part of this hierarchy: the
//! bridge hides connection churn behind its stream handles and records
//! socket errors in `last_socket_error` instead of raising them. What is
//! left for the caller are configuration problems at construction time and
//! the I/O errors of the local stream endpoints.

use std::io;

use thiserror::Error;

/// Top-level error type for stream-bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid or out-of-range values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors on the local stream endpoints
    #[error("Bridge I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BridgeError {
    /// Check if this error is recoverable (can retry operation)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_recoverable(),
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::ConnectionReset
            ),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Size value exceeds the supported range
    #[error("{field} = {value} exceeds the supported maximum of {max} bytes")]
    SizeOutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

impl ConfigError {
    /// Config errors are not recoverable without user intervention
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }

    /// Create a size out-of-range error for `field`
    #[must_use]
    pub const fn size_out_of_range(field: &'static str, value: usize, max: usize) -> Self {
        Self::SizeOutOfRange { field, value, max }
    }
}

/// Type alias for Result with `BridgeError`
pub type Result<T> = std::result::Result<T, BridgeError>;
