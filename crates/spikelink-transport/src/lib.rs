//! Blocking TCP transport for the probe/processor link.
//!
//! This is the lowest layer of spikelink. It owns socket setup (bind, accept,
//! connect) and hands every layer above it a [`LinkStream`], a connected
//! byte stream that implements `Read + Write`.
//!
//! There is exactly one transport: a reliable, ordered TCP byte stream.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::TcpTransport;
