use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::record::{RecordKind, ACK_SIZE, HANDSHAKE_SIZE, PREDICTION_WIDTH, SAMPLE_WIDTH};

/// Wire size of a sample record with `channel_count` channels.
pub const fn sample_frame_size(channel_count: usize) -> usize {
    channel_count * SAMPLE_WIDTH
}

/// Wire size of a prediction record with `channel_count` channels.
pub const fn prediction_frame_size(channel_count: usize) -> usize {
    channel_count * PREDICTION_WIDTH
}

/// Record sizes for one negotiated channel count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    channel_count: usize,
}

impl FrameLayout {
    /// Create a layout for `channel_count` channels.
    pub fn new(channel_count: usize) -> Self {
        Self { channel_count }
    }

    /// The channel count this layout was built for.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Bytes in one sample record.
    pub fn sample_size(&self) -> usize {
        sample_frame_size(self.channel_count)
    }

    /// Bytes in one prediction record.
    pub fn prediction_size(&self) -> usize {
        prediction_frame_size(self.channel_count)
    }

    /// Bytes moved over the wire for one full tick (sample out, prediction back).
    pub fn tick_size(&self) -> usize {
        self.sample_size() + self.prediction_size()
    }
}

/// Encode the handshake record.
///
/// Wire format:
/// ```text
/// ┌─────────────────────┐
/// │ channel count (i32) │
/// └─────────────────────┘
/// ```
pub fn encode_handshake(channel_count: i32, dst: &mut BytesMut) {
    dst.reserve(HANDSHAKE_SIZE);
    dst.put_i32_ne(channel_count);
}

/// Decode a handshake record.
pub fn decode_handshake(src: &[u8]) -> Result<i32> {
    decode_word(RecordKind::Handshake, HANDSHAKE_SIZE, src)
}

/// Encode the acknowledgment record.
pub fn encode_ack(code: i32, dst: &mut BytesMut) {
    dst.reserve(ACK_SIZE);
    dst.put_i32_ne(code);
}

/// Decode an acknowledgment record.
pub fn decode_ack(src: &[u8]) -> Result<i32> {
    decode_word(RecordKind::Ack, ACK_SIZE, src)
}

/// Encode a sample record.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬─────┬──────────────────┐
/// │ ch 0 (i32)   │ ch 1 (i32)   │ ... │ ch n-1 (i32)     │
/// └──────────────┴──────────────┴─────┴──────────────────┘
/// ```
pub fn encode_sample(sample: &[i32], dst: &mut BytesMut) {
    dst.reserve(sample_frame_size(sample.len()));
    for &value in sample {
        dst.put_i32_ne(value);
    }
}

/// Decode a sample record into `dst`, which must have one slot per channel.
pub fn decode_sample(src: &[u8], dst: &mut [i32]) -> Result<()> {
    check_len(RecordKind::Sample, sample_frame_size(dst.len()), src.len())?;
    let mut src = src;
    for slot in dst.iter_mut() {
        *slot = src.get_i32_ne();
    }
    Ok(())
}

/// Encode a prediction record.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬─────┬──────────────────┐
/// │ ch 0 (f64)   │ ch 1 (f64)   │ ... │ ch n-1 (f64)     │
/// └──────────────┴──────────────┴─────┴──────────────────┘
/// ```
pub fn encode_prediction(prediction: &[f64], dst: &mut BytesMut) {
    dst.reserve(prediction_frame_size(prediction.len()));
    for &value in prediction {
        dst.put_f64_ne(value);
    }
}

/// Decode a prediction record into `dst`, which must have one slot per channel.
pub fn decode_prediction(src: &[u8], dst: &mut [f64]) -> Result<()> {
    check_len(
        RecordKind::Prediction,
        prediction_frame_size(dst.len()),
        src.len(),
    )?;
    let mut src = src;
    for slot in dst.iter_mut() {
        *slot = src.get_f64_ne();
    }
    Ok(())
}

fn decode_word(record: RecordKind, size: usize, src: &[u8]) -> Result<i32> {
    check_len(record, size, src.len())?;
    let mut src = src;
    Ok(src.get_i32_ne())
}

fn check_len(record: RecordKind, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(FrameError::LengthMismatch {
            record,
            expected,
            got,
        });
    }
    Ok(())
}
