use crate::record::RecordKind;

/// Errors that can occur during record encoding/decoding and stream I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing records.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed cleanly where a record was required.
    #[error("connection closed while waiting for {record} record")]
    ConnectionClosed { record: RecordKind },

    /// The connection was closed after part of a record had arrived.
    #[error("truncated {record} record ({received} of {expected} bytes)")]
    Truncated {
        record: RecordKind,
        expected: usize,
        received: usize,
    },

    /// The stream accepted zero bytes while a record was being written.
    #[error("connection stopped accepting {record} record bytes")]
    WriteZero { record: RecordKind },

    /// A buffer does not match the record size it is being decoded as.
    #[error("{record} record length mismatch (expected {expected} bytes, got {got})")]
    LengthMismatch {
        record: RecordKind,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
