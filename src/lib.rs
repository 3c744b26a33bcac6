//! stream-bridge: persistent TCP-to-stream bridge
//!
//! This crate exposes a pair of long-lived local byte streams backed by a
//! single-client TCP listener whose remote endpoint may come and go. Bytes
//! written locally are shipped to whichever client is currently connected,
//! or cached in a bounded ring while nobody is; bytes received from the
//! client are delivered through the inbound stream. Reconnects are invisible
//! to the local streams.
//!
//! # Features
//!
//! - **Connection-independent streams**: `Incoming`/`Outgoing` stay open
//!   across remote disconnects and reconnects
//! - **Bounded buffering**: backpressured in-memory pipes with a pause
//!   threshold, plus a newest-wins ring cache for offline periods
//! - **Liveness by deadline**: every flush and send is bounded by a
//!   runtime-mutable bridge timeout
//! - **Graceful shutdown**: single-shot async disposal that cancels the
//!   tasks and completes the pipes
//!
//! # Architecture
//!
//! ```text
//! producer → Outgoing → outbound pipe → outbound pump → socket | ring → TCP
//! consumer ← Incoming ← inbound pipe  ← inbound pump  ← socket       ← TCP
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use stream_bridge::{Bridge, BridgeConfig};
//! use tokio::io::AsyncWriteExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::new().with_outgoing_cache_bytes(8192);
//! let mut bridge = Bridge::new("127.0.0.1:9001".parse()?, config)?;
//!
//! let mut outgoing = bridge.take_outgoing().expect("first take");
//! outgoing.write_all(b"buffered until somebody connects").await?;
//!
//! bridge.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`bridge`]: the bridge itself, its accept loop and pumps
//! - [`config`]: configuration types and defaults
//! - [`error`]: error types
//! - [`io`]: ring buffer and backpressured byte pipe

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod io;

// Re-export commonly used types at the crate root
pub use bridge::{Bridge, Incoming, Outgoing};
pub use config::BridgeConfig;
pub use error::{BridgeError, ConfigError};
pub use io::{BytePipe, RingBuffer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
