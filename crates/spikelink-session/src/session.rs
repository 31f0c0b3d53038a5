use std::fmt;
use std::net::SocketAddr;

use spikelink_frame::{FrameError, FrameLayout, FrameReader, FrameWriter, ReadStatus};
use spikelink_transport::LinkStream;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};

/// Which end of the link a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Originates samples and waits for predictions.
    Probe,
    /// Receives samples and answers with predictions.
    Processor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Probe => "probe",
            Role::Processor => "processor",
        })
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Handshaking,
    Streaming,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Handshaking => "handshaking",
            SessionState::Streaming => "streaming",
            SessionState::Closed => "closed",
        })
    }
}

/// One end of an established lock-step link.
///
/// Each tick is exactly one sample record from the probe followed by exactly
/// one prediction record from the processor. The session tracks whose turn it
/// is and rejects anything out of order, so a probe can never have more than
/// one sample in flight.
pub struct Session {
    role: Role,
    state: SessionState,
    layout: FrameLayout,
    reader: FrameReader<LinkStream>,
    writer: FrameWriter<LinkStream>,
    peer: Option<SocketAddr>,
    /// A sample has crossed the wire and its prediction has not.
    tick_open: bool,
    ticks: u64,
}

impl Session {
    /// Wrap a freshly connected stream; the session starts in
    /// [`SessionState::Handshaking`].
    pub(crate) fn open(role: Role, stream: LinkStream) -> Result<Self> {
        let peer = stream.peer_addr();
        let reader_stream = stream.try_clone()?;
        debug!(
            %role,
            peer = ?peer,
            from = %SessionState::Disconnected,
            to = %SessionState::Handshaking,
            "session state"
        );

        Ok(Self {
            role,
            state: SessionState::Handshaking,
            layout: FrameLayout::new(0),
            reader: FrameReader::new(reader_stream),
            writer: FrameWriter::new(stream),
            peer,
            tick_open: false,
            ticks: 0,
        })
    }

    pub(crate) fn io_mut(
        &mut self,
    ) -> (&mut FrameReader<LinkStream>, &mut FrameWriter<LinkStream>) {
        (&mut self.reader, &mut self.writer)
    }

    /// Record the negotiated channel count and start streaming.
    pub(crate) fn established(&mut self, channel_count: usize) {
        self.layout = FrameLayout::new(channel_count);
        self.transition(SessionState::Streaming);
    }

    /// Which end of the link this is.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while records can still be exchanged.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Streaming
    }

    /// Negotiated channel count (zero until the handshake completes).
    pub fn channel_count(&self) -> usize {
        self.layout.channel_count()
    }

    /// Record sizes for the negotiated channel count.
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Completed ticks: predictions received (probe) or sent (processor).
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Remote address, if known.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Send one sample record. Probe only.
    ///
    /// Fails if the prediction for the previous sample has not been received.
    pub fn send_sample(&mut self, sample: &[i32]) -> Result<()> {
        self.expect(Role::Probe, "send a sample")?;
        if self.tick_open {
            return Err(SessionError::Protocol(
                "sample sent before the previous prediction was received".to_string(),
            ));
        }
        self.check_len(sample.len())?;

        let result = self.writer.send_sample(sample);
        self.guard(result)?;
        self.tick_open = true;
        trace!(tick = self.ticks, "sample sent");
        Ok(())
    }

    /// Block until the prediction for the outstanding sample arrives. Probe only.
    pub fn recv_prediction(&mut self, dst: &mut [f64]) -> Result<()> {
        self.expect(Role::Probe, "receive a prediction")?;
        if !self.tick_open {
            return Err(SessionError::Protocol(
                "no sample is awaiting a prediction".to_string(),
            ));
        }
        self.check_len(dst.len())?;

        match self.reader.read_prediction(dst) {
            Ok(()) => {}
            Err(FrameError::ConnectionClosed { .. }) => {
                self.transition(SessionState::Closed);
                return Err(SessionError::Disconnected(
                    "processor closed the connection before sending a prediction".to_string(),
                ));
            }
            Err(err) => {
                self.transition(SessionState::Closed);
                return Err(err.into());
            }
        }

        self.tick_open = false;
        self.ticks += 1;
        trace!(tick = self.ticks, "prediction received");
        Ok(())
    }

    /// Block until the next sample arrives. Processor only.
    ///
    /// Returns [`ReadStatus::PeerClosed`] when the probe closed the
    /// connection between ticks; the session is then
    /// [`SessionState::Closed`] and this is the normal end of a run.
    pub fn recv_sample(&mut self, dst: &mut [i32]) -> Result<ReadStatus> {
        self.expect(Role::Processor, "receive a sample")?;
        if self.tick_open {
            return Err(SessionError::Protocol(
                "sample requested before the previous prediction was sent".to_string(),
            ));
        }
        self.check_len(dst.len())?;

        let result = self.reader.read_sample(dst);
        match self.guard(result)? {
            ReadStatus::Complete => {
                self.tick_open = true;
                trace!(tick = self.ticks, "sample received");
                Ok(ReadStatus::Complete)
            }
            ReadStatus::PeerClosed => {
                debug!(ticks = self.ticks, "probe closed the connection");
                self.transition(SessionState::Closed);
                Ok(ReadStatus::PeerClosed)
            }
        }
    }

    /// Send the prediction for the sample just received. Processor only.
    pub fn send_prediction(&mut self, prediction: &[f64]) -> Result<()> {
        self.expect(Role::Processor, "send a prediction")?;
        if !self.tick_open {
            return Err(SessionError::Protocol(
                "prediction sent without a pending sample".to_string(),
            ));
        }
        self.check_len(prediction.len())?;

        let result = self.writer.send_prediction(prediction);
        self.guard(result)?;
        self.tick_open = false;
        self.ticks += 1;
        trace!(tick = self.ticks, "prediction sent");
        Ok(())
    }

    /// Close the connection. The peer observes an orderly end of stream.
    ///
    /// Closing an already closed session is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.transition(SessionState::Closed);
        self.writer.get_ref().shutdown()?;
        Ok(())
    }

    fn expect(&self, role: Role, action: &str) -> Result<()> {
        if self.role != role {
            return Err(SessionError::Protocol(format!(
                "a {} session cannot {action}",
                self.role
            )));
        }
        match self.state {
            SessionState::Streaming => Ok(()),
            SessionState::Closed => Err(SessionError::Disconnected(format!(
                "cannot {action}: session is closed"
            ))),
            other => Err(SessionError::Protocol(format!(
                "cannot {action} while {other}"
            ))),
        }
    }

    fn check_len(&self, len: usize) -> Result<()> {
        let expected = self.layout.channel_count();
        if len != expected {
            return Err(SessionError::InvalidInput(format!(
                "record has {len} channels, session negotiated {expected}"
            )));
        }
        Ok(())
    }

    /// Any frame error leaves the stream at an unknown offset, so it ends
    /// the session.
    fn guard<T>(&mut self, result: spikelink_frame::Result<T>) -> Result<T> {
        result.map_err(|err| {
            self.transition(SessionState::Closed);
            SessionError::from(err)
        })
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(role = %self.role, from = %self.state, to = %to, "session state");
            self.state = to;
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("channel_count", &self.layout.channel_count())
            .field("peer", &self.peer)
            .field("ticks", &self.ticks)
            .finish()
    }
}
