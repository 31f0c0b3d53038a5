/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] spikelink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] spikelink_frame::FrameError),

    /// Filter construction or update failed.
    #[error("filter error: {0}")]
    Filter(#[from] spikelink_filter::FilterError),

    /// The peer broke the protocol, or an operation was issued out of turn.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Peer disconnected where more data was required.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// Caller supplied data the session cannot carry.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
