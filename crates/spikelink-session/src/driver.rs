//! Tick loops for both roles.
//!
//! [`ProbeDriver`] streams a [`SampleMatrix`] and times each round trip.
//! [`ProcessorDriver`] accepts one probe, builds the configured filter for the
//! announced channel count and answers every sample until the probe hangs up.

use std::net::SocketAddr;
use std::time::Instant;

use serde::Serialize;
use spikelink_filter::{FilterKind, FilterSpec, Predictor};
use spikelink_frame::ReadStatus;
use tracing::{debug, info};

use crate::connector::connect_with_config;
use crate::data::{PredictionMatrix, SampleMatrix};
use crate::error::{Result, SessionError};
use crate::handshake::HandshakeConfig;
use crate::listener::SessionListener;
use crate::session::{Role, Session};
use crate::timing::LatencyLog;

/// Default port shared by both roles.
pub const DEFAULT_PORT: u16 = 8889;

/// Everything the probe needs before it opens a connection.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub addr: SocketAddr,
    pub nodelay: bool,
    pub handshake: HandshakeConfig,
}

impl ProbeConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            nodelay: true,
            handshake: HandshakeConfig::default(),
        }
    }
}

/// Output of one probe run.
#[derive(Debug, Clone)]
pub struct ProbeRun {
    /// One prediction row per streamed tick.
    pub predictions: PredictionMatrix,
    /// One round-trip latency per streamed tick.
    pub latencies: LatencyLog,
}

impl ProbeRun {
    pub fn mean_latency_us(&self) -> Option<f64> {
        self.latencies.mean_us()
    }
}

/// Probe side of a run.
#[derive(Debug, Clone)]
pub struct ProbeDriver {
    config: ProbeConfig,
}

impl ProbeDriver {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Connect, stream every tick of `samples`, then close the connection.
    pub fn run(&self, samples: &SampleMatrix) -> Result<ProbeRun> {
        let mut session = connect_with_config(
            self.config.addr,
            samples.channel_count(),
            &self.config.handshake,
            self.config.nodelay,
        )?;

        let run = stream_samples(&mut session, samples)?;
        session.close()?;

        info!(
            ticks = run.latencies.len(),
            mean_us = run.mean_latency_us().unwrap_or(0.0),
            "probe run complete"
        );
        Ok(run)
    }
}

/// Stream `samples` over an established probe session, one tick at a time.
///
/// Each latency spans from just before the sample is written until the
/// prediction has been fully read.
pub fn stream_samples(session: &mut Session, samples: &SampleMatrix) -> Result<ProbeRun> {
    if session.role() != Role::Probe {
        return Err(SessionError::Protocol(
            "samples can only be streamed from a probe session".to_string(),
        ));
    }
    if session.channel_count() != samples.channel_count() {
        return Err(SessionError::InvalidInput(format!(
            "dataset has {} channels, session negotiated {}",
            samples.channel_count(),
            session.channel_count()
        )));
    }

    let ticks = samples.tick_count();
    let mut predictions = PredictionMatrix::with_capacity(samples.channel_count(), ticks);
    let mut latencies = LatencyLog::with_capacity(ticks);
    let mut prediction = vec![0.0f64; samples.channel_count()];

    for sample in samples.ticks() {
        let start = Instant::now();
        session.send_sample(sample)?;
        session.recv_prediction(&mut prediction)?;
        latencies.record(start.elapsed());

        predictions.push(&prediction)?;
    }

    debug!(ticks, "streamed all samples");
    Ok(ProbeRun {
        predictions,
        latencies,
    })
}

/// Everything the processor needs before it starts listening.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub addr: SocketAddr,
    pub nodelay: bool,
    pub filter: FilterSpec,
    pub handshake: HandshakeConfig,
}

impl ProcessorConfig {
    pub fn new(addr: SocketAddr, filter: FilterSpec) -> Self {
        Self {
            addr,
            nodelay: true,
            filter,
            handshake: HandshakeConfig::default(),
        }
    }
}

/// Outcome of one served session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServeSummary {
    pub filter: FilterKind,
    pub channel_count: usize,
    pub ticks: u64,
}

/// Processor side of a run.
#[derive(Debug)]
pub struct ProcessorDriver {
    listener: SessionListener,
    filter: FilterSpec,
}

impl ProcessorDriver {
    /// Validate the filter parameters and bind the listening socket.
    pub fn bind(config: ProcessorConfig) -> Result<Self> {
        config.filter.validate()?;
        let listener = SessionListener::bind(config.addr)?
            .with_handshake_config(config.handshake)
            .with_nodelay(config.nodelay);
        Ok(Self {
            listener,
            filter: config.filter,
        })
    }

    /// Bound address (with the real port when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Accept exactly one probe and serve it until it disconnects.
    ///
    /// Filter state is allocated after the handshake is read and before the
    /// acknowledgment is sent, and dropped when this returns.
    pub fn serve(&self) -> Result<ServeSummary> {
        let spec = self.filter;
        let (mut session, mut filter) = self
            .listener
            .accept_with(|channel_count| Ok(spec.build(channel_count)?))?;

        info!(
            filter = filter.name(),
            channel_count = session.channel_count(),
            "serving probe"
        );

        let ticks = serve_session(&mut session, &mut filter)?;
        session.close()?;

        info!(ticks, "session finished");
        Ok(ServeSummary {
            filter: filter.kind(),
            channel_count: session.channel_count(),
            ticks,
        })
    }
}

/// Answer samples on `session` with `filter` until the probe closes the
/// connection. Returns the number of completed ticks.
pub fn serve_session<P: Predictor + ?Sized>(session: &mut Session, filter: &mut P) -> Result<u64> {
    if session.role() != Role::Processor {
        return Err(SessionError::Protocol(
            "only a processor session can be served".to_string(),
        ));
    }
    let channel_count = session.channel_count();
    if filter.dim() != channel_count {
        return Err(SessionError::InvalidInput(format!(
            "filter has {} channels, session negotiated {channel_count}",
            filter.dim()
        )));
    }

    let mut sample = vec![0i32; channel_count];
    let mut input = vec![0.0f64; channel_count];

    loop {
        match session.recv_sample(&mut sample)? {
            ReadStatus::Complete => {}
            ReadStatus::PeerClosed => break,
        }

        for (dst, &src) in input.iter_mut().zip(&sample) {
            *dst = f64::from(src);
        }
        let prediction = filter.predict_next(&input)?;
        session.send_prediction(prediction)?;
    }

    Ok(session.ticks())
}
