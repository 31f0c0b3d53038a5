//! Lock-step probe/processor sessions over TCP.
//!
//! A [`Session`] is one end of an established link, tagged with its
//! [`Role`]. The probe sends one sample record per tick and blocks for the
//! matching prediction record; the processor does the reverse. Neither side
//! can get ahead of the other.
//!
//! [`ProbeDriver`] and [`ProcessorDriver`] run the tick loops on top of a
//! session, with latency timing on the probe side and an adaptive filter on
//! the processor side.

pub mod connector;
pub mod data;
pub mod driver;
pub mod error;
pub mod handshake;
pub mod listener;
pub mod session;
pub mod timing;

pub use connector::{connect, connect_with_config};
pub use data::{PredictionMatrix, SampleMatrix};
pub use driver::{
    serve_session, stream_samples, ProbeConfig, ProbeDriver, ProbeRun, ProcessorConfig,
    ProcessorDriver, ServeSummary, DEFAULT_PORT,
};
pub use error::{Result, SessionError};
pub use handshake::{
    handshake_probe, handshake_processor, handshake_processor_with, HandshakeConfig,
    HandshakeResult, DEFAULT_MAX_CHANNELS,
};
pub use listener::SessionListener;
pub use session::{Role, Session, SessionState};
pub use timing::{LatencyLog, LatencySummary};
