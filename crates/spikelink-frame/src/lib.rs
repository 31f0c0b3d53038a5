//! Fixed-size record framing for the probe/processor wire.
//!
//! The wire carries four record shapes and nothing else:
//! - handshake: one `i32`, the channel count (probe → processor)
//! - acknowledgment: one `i32`, always [`ACK_CODE`] (processor → probe)
//! - sample: `channel_count` × `i32` (probe → processor)
//! - prediction: `channel_count` × `f64` (processor → probe)
//!
//! Records carry no tag and no length prefix. Both peers know every size from
//! the negotiated channel count, and the meaning of a record comes from where
//! it sits in the session. Values are native-endian.
//!
//! Readers and writers always move whole records: partial reads and writes
//! are retried internally, and a stream that ends mid-record is an error.

pub mod codec;
pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use codec::{
    decode_ack, decode_handshake, decode_prediction, decode_sample, encode_ack, encode_handshake,
    encode_prediction, encode_sample, prediction_frame_size, sample_frame_size, FrameLayout,
};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, ReadStatus};
pub use record::{RecordKind, ACK_CODE, ACK_SIZE, HANDSHAKE_SIZE, PREDICTION_WIDTH, SAMPLE_WIDTH};
pub use writer::FrameWriter;
