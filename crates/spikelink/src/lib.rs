//! Closed-loop latency measurement over a lock-step TCP link.
//!
//! A probe streams integer sample vectors to a processor, which answers each
//! one with the next-tick prediction of an online adaptive filter. The probe
//! times every round trip.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP bind/accept/connect and the owned stream handle
//! - [`frame`]: Fixed-size handshake, ack, sample and prediction records
//! - [`filter`]: LMS predictor and the echo baseline
//! - [`session`]: Role-tagged sessions, handshake, and the tick drivers

/// Re-export transport types.
pub mod transport {
    pub use spikelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use spikelink_frame::*;
}

/// Re-export filter types.
pub mod filter {
    pub use spikelink_filter::*;
}

/// Re-export session types.
pub mod session {
    pub use spikelink_session::*;
}
