use std::net::SocketAddr;

use spikelink_transport::TcpTransport;
use tracing::info;

use crate::error::Result;
use crate::handshake::{handshake_probe, HandshakeConfig};
use crate::session::{Role, Session};

/// Connect to a listening processor as the probe and announce
/// `channel_count` channels.
pub fn connect(addr: SocketAddr, channel_count: usize) -> Result<Session> {
    connect_with_config(addr, channel_count, &HandshakeConfig::default(), true)
}

/// Connect with explicit configuration.
///
/// `nodelay` sets `TCP_NODELAY` on the socket before the handshake is sent.
pub fn connect_with_config(
    addr: SocketAddr,
    channel_count: usize,
    handshake_config: &HandshakeConfig,
    nodelay: bool,
) -> Result<Session> {
    let stream = TcpTransport::connect(addr)?;
    stream.set_nodelay(nodelay)?;

    let mut session = Session::open(Role::Probe, stream)?;
    let (reader, writer) = session.io_mut();
    let handshake = handshake_probe(reader, writer, channel_count, handshake_config)?;
    session.established(handshake.channel_count);

    info!(%addr, channel_count, nodelay, "connected to processor");
    Ok(session)
}
