use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_ack, encode_handshake, encode_prediction, encode_sample};
use crate::error::{FrameError, Result};
use crate::record::RecordKind;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Writes complete fixed-size records to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new record writer.
    pub fn new(inner: T) -> Self {
        Self::with_capacity(inner, INITIAL_BUFFER_CAPACITY)
    }

    /// Create a new record writer with a preallocated buffer of `capacity` bytes.
    pub fn with_capacity(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Send the handshake record (blocking).
    pub fn send_handshake(&mut self, channel_count: i32) -> Result<()> {
        self.buf.clear();
        encode_handshake(channel_count, &mut self.buf);
        self.write_record(RecordKind::Handshake)
    }

    /// Send an acknowledgment record carrying `code` (blocking).
    pub fn send_ack(&mut self, code: i32) -> Result<()> {
        self.buf.clear();
        encode_ack(code, &mut self.buf);
        self.write_record(RecordKind::Ack)
    }

    /// Send one sample record (blocking).
    pub fn send_sample(&mut self, sample: &[i32]) -> Result<()> {
        self.buf.clear();
        encode_sample(sample, &mut self.buf);
        self.write_record(RecordKind::Sample)
    }

    /// Send one prediction record (blocking).
    pub fn send_prediction(&mut self, prediction: &[f64]) -> Result<()> {
        self.buf.clear();
        encode_prediction(prediction, &mut self.buf);
        self.write_record(RecordKind::Prediction)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn write_record(&mut self, record: RecordKind) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::WriteZero { record }),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        trace!(%record, bytes = offset, "wrote record");
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{decode_prediction, decode_sample, sample_frame_size};

    #[test]
    fn write_single_sample() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_sample(&[5, 6, 7]).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), sample_frame_size(3));
        let mut dst = [0i32; 3];
        decode_sample(&wire, &mut dst).unwrap();
        assert_eq!(dst, [5, 6, 7]);
    }

    #[test]
    fn write_session_sequence() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_handshake(2).unwrap();
        writer.send_sample(&[1, 2]).unwrap();
        writer.send_sample(&[3, 4]).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), 4 + 2 * sample_frame_size(2));
        assert_eq!(&wire[..4], &2i32.to_ne_bytes());
    }

    #[test]
    fn write_prediction_record() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_prediction(&[0.25, 4.0]).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut dst = [0.0f64; 2];
        decode_prediction(&wire, &mut dst).unwrap();
        assert_eq!(dst, [0.25, 4.0]);
    }

    #[test]
    fn short_writes_are_completed() {
        let sink = ChunkedWriter {
            written: Vec::new(),
            chunk: 3,
        };
        let mut writer = FrameWriter::new(sink);
        writer.send_prediction(&[1.0, 2.0, 3.0]).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.written.len(), 24);
        let mut dst = [0.0f64; 3];
        decode_prediction(&sink.written, &mut dst).unwrap();
        assert_eq!(dst, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn write_zero_is_error() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send_sample(&[1]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::WriteZero {
                record: RecordKind::Sample
            }
        ));
    }

    #[test]
    fn interrupted_write_retries() {
        let mut writer = FrameWriter::new(InterruptOnce {
            interrupted: false,
            written: Vec::new(),
        });
        writer.send_ack(crate::ACK_CODE).unwrap();

        let sink = writer.into_inner();
        assert!(sink.interrupted);
        assert_eq!(sink.written, 1i32.to_ne_bytes().to_vec());
    }

    struct ChunkedWriter {
        written: Vec<u8>,
        chunk: usize,
    }

    impl Write for ChunkedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.chunk);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptOnce {
        interrupted: bool,
        written: Vec<u8>,
    }

    impl Write for InterruptOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
