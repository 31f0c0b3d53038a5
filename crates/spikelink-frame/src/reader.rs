use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_ack, decode_handshake, decode_prediction, decode_sample};
use crate::error::{FrameError, Result};
use crate::record::{RecordKind, ACK_SIZE, HANDSHAKE_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Outcome of a read that is allowed to observe an orderly close.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// A whole record was read and decoded.
    Complete,
    /// The peer closed the connection before the first byte of the record.
    PeerClosed,
}

/// Reads complete fixed-size records from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete records.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> FrameReader<T> {
    /// Create a new record reader.
    pub fn new(inner: T) -> Self {
        Self::with_capacity(inner, INITIAL_BUFFER_CAPACITY)
    }

    /// Create a new record reader with a preallocated buffer of `capacity` bytes.
    pub fn with_capacity(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Read the handshake record (blocking).
    pub fn read_handshake(&mut self) -> Result<i32> {
        self.fill_required(RecordKind::Handshake, HANDSHAKE_SIZE)?;
        decode_handshake(&self.buf)
    }

    /// Read the acknowledgment record (blocking).
    pub fn read_ack(&mut self) -> Result<i32> {
        self.fill_required(RecordKind::Ack, ACK_SIZE)?;
        decode_ack(&self.buf)
    }

    /// Read the next sample record into `dst` (blocking).
    ///
    /// Returns [`ReadStatus::PeerClosed`] when the stream ends exactly on a
    /// record boundary; `dst` is left untouched in that case.
    pub fn read_sample(&mut self, dst: &mut [i32]) -> Result<ReadStatus> {
        let len = RecordKind::Sample.wire_size(dst.len());
        match self.fill(RecordKind::Sample, len)? {
            ReadStatus::Complete => {
                decode_sample(&self.buf, dst)?;
                Ok(ReadStatus::Complete)
            }
            ReadStatus::PeerClosed => Ok(ReadStatus::PeerClosed),
        }
    }

    /// Read the next prediction record into `dst` (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_prediction(&mut self, dst: &mut [f64]) -> Result<()> {
        let len = RecordKind::Prediction.wire_size(dst.len());
        self.fill_required(RecordKind::Prediction, len)?;
        decode_prediction(&self.buf, dst)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn fill_required(&mut self, record: RecordKind, len: usize) -> Result<()> {
        match self.fill(record, len)? {
            ReadStatus::Complete => Ok(()),
            ReadStatus::PeerClosed => Err(FrameError::ConnectionClosed { record }),
        }
    }

    fn fill(&mut self, record: RecordKind, len: usize) -> Result<ReadStatus> {
        self.buf.clear();
        self.buf.resize(len, 0);

        let mut filled = 0usize;
        while filled < len {
            let read = match self.inner.read(&mut self.buf[filled..]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if filled == 0 {
                    return Ok(ReadStatus::PeerClosed);
                }
                return Err(FrameError::Truncated {
                    record,
                    expected: len,
                    received: filled,
                });
            }

            filled += read;
        }

        trace!(%record, bytes = len, "read record");
        Ok(ReadStatus::Complete)
    }
}
