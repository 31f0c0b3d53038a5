//! Record kinds and their fixed sizes.

use std::fmt;

/// Size of the handshake record (one `i32` channel count).
pub const HANDSHAKE_SIZE: usize = 4;

/// Size of the acknowledgment record (one `i32`).
pub const ACK_SIZE: usize = 4;

/// Value the processor sends to accept a handshake.
pub const ACK_CODE: i32 = 1;

/// Bytes per channel in a sample record.
pub const SAMPLE_WIDTH: usize = std::mem::size_of::<i32>();

/// Bytes per channel in a prediction record.
pub const PREDICTION_WIDTH: usize = std::mem::size_of::<f64>();

/// The four record shapes that can appear on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Handshake,
    Ack,
    Sample,
    Prediction,
}

impl RecordKind {
    /// Returns a human-readable name for the record.
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Handshake => "handshake",
            RecordKind::Ack => "ack",
            RecordKind::Sample => "sample",
            RecordKind::Prediction => "prediction",
        }
    }

    /// Wire size of this record for a session with `channel_count` channels.
    pub fn wire_size(self, channel_count: usize) -> usize {
        match self {
            RecordKind::Handshake => HANDSHAKE_SIZE,
            RecordKind::Ack => ACK_SIZE,
            RecordKind::Sample => channel_count * SAMPLE_WIDTH,
            RecordKind::Prediction => channel_count * PREDICTION_WIDTH,
        }
    }

    /// Returns true if the size of this record depends on the channel count.
    pub fn is_per_channel(self) -> bool {
        matches!(self, RecordKind::Sample | RecordKind::Prediction)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_records_do_not_scale_with_channels() {
        for n in [1, 2, 96, 1024] {
            assert_eq!(RecordKind::Handshake.wire_size(n), 4);
            assert_eq!(RecordKind::Ack.wire_size(n), 4);
        }
        assert!(!RecordKind::Handshake.is_per_channel());
        assert!(!RecordKind::Ack.is_per_channel());
    }

    #[test]
    fn data_records_scale_with_channels() {
        assert_eq!(RecordKind::Sample.wire_size(6), 24);
        assert_eq!(RecordKind::Prediction.wire_size(6), 48);
        assert!(RecordKind::Sample.is_per_channel());
        assert!(RecordKind::Prediction.is_per_channel());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(RecordKind::Prediction.to_string(), "prediction");
    }
}
