use std::io::{Read, Write};

use spikelink_frame::{FrameError, FrameReader, FrameWriter, ACK_CODE};
use tracing::debug;

use crate::error::{Result, SessionError};

/// Largest channel count a processor accepts unless configured otherwise.
pub const DEFAULT_MAX_CHANNELS: usize = 1024;

/// Configuration for the opening exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Value the processor sends back once it is ready to stream.
    pub ack_code: i32,
    /// Upper bound on the channel count either side will negotiate.
    ///
    /// This bounds the channel count only. Filter state also grows with the
    /// LMS order, which the filter checks on its own before allocating.
    pub max_channels: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            ack_code: ACK_CODE,
            max_channels: DEFAULT_MAX_CHANNELS,
        }
    }
}

/// Result of a successful handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeResult {
    /// Channel count fixed for the rest of the session.
    pub channel_count: usize,
}

/// Perform the probe side of the handshake.
///
/// Sends `channel_count` and blocks until the processor acknowledges it.
pub fn handshake_probe<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    channel_count: usize,
    config: &HandshakeConfig,
) -> Result<HandshakeResult> {
    let wire_count = validate_outgoing(channel_count, config)?;

    writer.send_handshake(wire_count)?;
    debug!(channel_count, "sent handshake");

    let ack = match reader.read_ack() {
        Ok(ack) => ack,
        Err(FrameError::ConnectionClosed { .. }) | Err(FrameError::Truncated { .. }) => {
            return Err(SessionError::Protocol(
                "processor closed the connection before acknowledging".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    if ack != config.ack_code {
        return Err(SessionError::Protocol(format!(
            "unexpected acknowledgment {ack} (expected {})",
            config.ack_code
        )));
    }

    debug!(channel_count, "handshake acknowledged");
    Ok(HandshakeResult { channel_count })
}

/// Perform the processor side of the handshake.
pub fn handshake_processor<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    config: &HandshakeConfig,
) -> Result<HandshakeResult> {
    handshake_processor_with(reader, writer, config, |_| Ok(())).map(|(result, ())| result)
}

/// Processor handshake that runs `prepare` between receiving the channel
/// count and sending the acknowledgment.
///
/// `prepare` is where per-session state sized to the channel count gets
/// allocated. If it fails, no acknowledgment is sent and the error is
/// returned.
pub fn handshake_processor_with<R, W, F, A>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    config: &HandshakeConfig,
    prepare: F,
) -> Result<(HandshakeResult, A)>
where
    R: Read,
    W: Write,
    F: FnOnce(usize) -> Result<A>,
{
    let raw = match reader.read_handshake() {
        Ok(raw) => raw,
        Err(FrameError::ConnectionClosed { .. }) | Err(FrameError::Truncated { .. }) => {
            return Err(SessionError::Protocol(
                "probe closed the connection during handshake".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let channel_count = validate_incoming(raw, config)?;
    debug!(channel_count, "received handshake");

    let prepared = prepare(channel_count)?;

    writer.send_ack(config.ack_code)?;
    debug!(channel_count, ack = config.ack_code, "sent acknowledgment");

    Ok((HandshakeResult { channel_count }, prepared))
}

fn validate_outgoing(channel_count: usize, config: &HandshakeConfig) -> Result<i32> {
    if channel_count == 0 {
        return Err(SessionError::InvalidInput(
            "channel count must be greater than zero".to_string(),
        ));
    }
    if channel_count > config.max_channels {
        return Err(SessionError::InvalidInput(format!(
            "channel count {channel_count} exceeds maximum {}",
            config.max_channels
        )));
    }
    i32::try_from(channel_count).map_err(|_| {
        SessionError::InvalidInput(format!("channel count {channel_count} does not fit the wire"))
    })
}

fn validate_incoming(raw: i32, config: &HandshakeConfig) -> Result<usize> {
    if raw <= 0 {
        return Err(SessionError::Protocol(format!(
            "invalid channel count {raw} in handshake"
        )));
    }
    // Positive i32 always fits in usize on supported targets.
    let channel_count = raw as usize;
    if channel_count > config.max_channels {
        return Err(SessionError::Protocol(format!(
            "channel count {channel_count} exceeds maximum {}",
            config.max_channels
        )));
    }
    Ok(channel_count)
}
