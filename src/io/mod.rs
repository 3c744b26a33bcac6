//! Byte-level plumbing for the bridge
//!
//! Two building blocks live here:
//!
//! - [`RingBuffer`]: the fixed-capacity outgoing cache with newest-wins
//!   eviction, used while no remote client is connected.
//! - [`BytePipe`]: the bounded in-memory pipe that decouples the pumps from
//!   the externally visible stream handles and carries the backpressure
//!   discipline.

pub mod pipe;
pub mod ring;

pub use pipe::{BytePipe, DEFAULT_PAUSE_THRESHOLD};
pub use ring::RingBuffer;
