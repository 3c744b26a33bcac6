//! Configuration types for the bridge
//!
//! This module provides [`BridgeConfig`], the options record a bridge is
//! constructed from. Numeric fields have published defaults and minimums:
//! values below a minimum are clamped up by [`BridgeConfig::normalized`],
//! while sizes beyond the supported range are rejected by
//! [`BridgeConfig::validate`].
//!
//! # Example
//!
//! ```
//! use stream_bridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_bridge_timeout_ms(500)
//!     .with_outgoing_cache_bytes(1024)
//!     .with_pause_writer_threshold_bytes(64 * 1024);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default delay between accept attempts (1s)
pub const DEFAULT_ACCEPT_INTERVAL_MS: u64 = 1000;

/// Default deadline for a single flush/send operation (3s)
pub const DEFAULT_BRIDGE_TIMEOUT_MS: u64 = 3000;

/// Default capacity of the outgoing cache (4 KiB)
pub const DEFAULT_OUTGOING_CACHE_BYTES: usize = 4096;

/// Minimum accepted flush/send deadline (100ms)
pub const MIN_BRIDGE_TIMEOUT_MS: u64 = 100;

/// Minimum accepted size for the optional buffer settings (1 KiB)
pub const MIN_BUFFER_BYTES: usize = 1024;

/// Largest accepted size for any buffer or cache setting
pub const MAX_SIZE_BYTES: usize = i32::MAX as usize;

/// Configuration for a [`Bridge`](crate::Bridge)
///
/// All values are fixed once the bridge is constructed, except the accept
/// interval and bridge timeout, which the bridge re-reads on every loop
/// iteration and exposes as runtime-mutable properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Delay in milliseconds between accept attempts after a connection
    /// ends or the listener fails
    #[serde(default = "default_accept_interval_ms")]
    pub accept_interval_ms: u64,

    /// Deadline in milliseconds for a single flush/send operation; on
    /// expiry the operation is abandoned and its bytes are dropped
    #[serde(default = "default_bridge_timeout_ms")]
    pub bridge_timeout_ms: u64,

    /// Capacity of the ring cache that holds outbound bytes while no
    /// client is connected
    #[serde(default = "default_outgoing_cache_bytes")]
    pub outgoing_cache_bytes: usize,

    /// High-water mark at which a pipe backpressures its producer; unset
    /// means the library default of 64 KiB
    #[serde(default)]
    pub pause_writer_threshold_bytes: Option<usize>,

    /// Socket send buffer size applied after accept; unset means OS default
    #[serde(default)]
    pub send_buffer_bytes: Option<usize>,

    /// Socket receive buffer size applied after accept; unset means OS
    /// default
    #[serde(default)]
    pub recv_buffer_bytes: Option<usize>,
}

fn default_accept_interval_ms() -> u64 {
    DEFAULT_ACCEPT_INTERVAL_MS
}

fn default_bridge_timeout_ms() -> u64 {
    DEFAULT_BRIDGE_TIMEOUT_MS
}

fn default_outgoing_cache_bytes() -> usize {
    DEFAULT_OUTGOING_CACHE_BYTES
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            accept_interval_ms: DEFAULT_ACCEPT_INTERVAL_MS,
            bridge_timeout_ms: DEFAULT_BRIDGE_TIMEOUT_MS,
            outgoing_cache_bytes: DEFAULT_OUTGOING_CACHE_BYTES,
            pause_writer_threshold_bytes: None,
            send_buffer_bytes: None,
            recv_buffer_bytes: None,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with all defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accept interval in milliseconds
    #[must_use]
    pub const fn with_accept_interval_ms(mut self, ms: u64) -> Self {
        self.accept_interval_ms = ms;
        self
    }

    /// Set the flush/send deadline in milliseconds
    #[must_use]
    pub const fn with_bridge_timeout_ms(mut self, ms: u64) -> Self {
        self.bridge_timeout_ms = ms;
        self
    }

    /// Set the outgoing cache capacity in bytes
    #[must_use]
    pub const fn with_outgoing_cache_bytes(mut self, bytes: usize) -> Self {
        self.outgoing_cache_bytes = bytes;
        self
    }

    /// Set the pipe pause threshold in bytes
    #[must_use]
    pub const fn with_pause_writer_threshold_bytes(mut self, bytes: usize) -> Self {
        self.pause_writer_threshold_bytes = Some(bytes);
        self
    }

    /// Set the socket send buffer size in bytes
    #[must_use]
    pub const fn with_send_buffer_bytes(mut self, bytes: usize) -> Self {
        self.send_buffer_bytes = Some(bytes);
        self
    }

    /// Set the socket receive buffer size in bytes
    #[must_use]
    pub const fn with_recv_buffer_bytes(mut self, bytes: usize) -> Self {
        self.recv_buffer_bytes = Some(bytes);
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SizeOutOfRange`] if any size field exceeds
    /// [`MAX_SIZE_BYTES`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("outgoing_cache_bytes", Some(self.outgoing_cache_bytes)),
            (
                "pause_writer_threshold_bytes",
                self.pause_writer_threshold_bytes,
            ),
            ("send_buffer_bytes", self.send_buffer_bytes),
            ("recv_buffer_bytes", self.recv_buffer_bytes),
        ];
        for (field, value) in sizes {
            if let Some(value) = value {
                if value > MAX_SIZE_BYTES {
                    return Err(ConfigError::size_out_of_range(field, value, MAX_SIZE_BYTES));
                }
            }
        }
        Ok(())
    }

    /// Return a copy with every value clamped to its published minimum
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            accept_interval_ms: self.accept_interval_ms,
            bridge_timeout_ms: self.bridge_timeout_ms.max(MIN_BRIDGE_TIMEOUT_MS),
            outgoing_cache_bytes: self.outgoing_cache_bytes,
            pause_writer_threshold_bytes: self
                .pause_writer_threshold_bytes
                .map(|v| v.max(MIN_BUFFER_BYTES)),
            send_buffer_bytes: self.send_buffer_bytes.map(|v| v.max(MIN_BUFFER_BYTES)),
            recv_buffer_bytes: self.recv_buffer_bytes.map(|v| v.max(MIN_BUFFER_BYTES)),
        }
    }
}
