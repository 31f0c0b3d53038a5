use std::net::SocketAddr;

use spikelink_transport::TcpTransport;
use tracing::info;

use crate::error::Result;
use crate::handshake::{handshake_processor_with, HandshakeConfig};
use crate::session::{Role, Session};

/// Listens for and accepts probe connections.
pub struct SessionListener {
    transport: TcpTransport,
    handshake_config: HandshakeConfig,
    nodelay: bool,
}

impl SessionListener {
    /// Bind to a TCP address.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self {
            transport,
            handshake_config: HandshakeConfig::default(),
            nodelay: true,
        })
    }

    /// Override handshake config.
    pub fn with_handshake_config(mut self, config: HandshakeConfig) -> Self {
        self.handshake_config = config;
        self
    }

    /// Set `TCP_NODELAY` on accepted connections (on by default).
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Accept the next probe and complete the handshake.
    pub fn accept(&self) -> Result<Session> {
        self.accept_with(|_| Ok(())).map(|(session, ())| session)
    }

    /// Accept the next probe, running `prepare` with the announced channel
    /// count before the acknowledgment goes out.
    pub fn accept_with<F, A>(&self, prepare: F) -> Result<(Session, A)>
    where
        F: FnOnce(usize) -> Result<A>,
    {
        let stream = self.transport.accept()?;
        stream.set_nodelay(self.nodelay)?;

        let mut session = Session::open(Role::Processor, stream)?;
        let (reader, writer) = session.io_mut();
        let (handshake, prepared) =
            handshake_processor_with(reader, writer, &self.handshake_config, prepare)?;
        session.established(handshake.channel_count);

        info!(
            peer = ?session.peer_addr(),
            channel_count = handshake.channel_count,
            "probe connected"
        );
        Ok((session, prepared))
    }

    /// Bound address (with the real port when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }
}

impl std::fmt::Debug for SessionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionListener")
            .field("addr", &self.transport.local_addr())
            .field("handshake_config", &self.handshake_config)
            .field("nodelay", &self.nodelay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::connector::{connect, connect_with_config};
    use crate::error::SessionError;

    fn bind_loopback() -> SessionListener {
        SessionListener::bind("127.0.0.1:0".parse().unwrap()).unwrap()
    }

    #[test]
    fn accept_returns_streaming_session() {
        let listener = bind_loopback();
        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);

        let probe = thread::spawn(move || connect(addr, 3).unwrap());

        let session = listener.accept().unwrap();
        assert_eq!(session.role(), Role::Processor);
        assert_eq!(session.channel_count(), 3);
        assert!(session.is_connected());

        let probe = probe.join().unwrap();
        assert_eq!(probe.role(), Role::Probe);
    }

    #[test]
    fn accept_with_allocates_before_ack() {
        let listener = bind_loopback();
        let addr = listener.local_addr();

        let probe = thread::spawn(move || connect(addr, 12).unwrap());

        let (session, buffer) = listener.accept_with(|n| Ok(vec![0i32; n])).unwrap();
        assert_eq!(buffer.len(), session.channel_count());
        probe.join().unwrap();
    }

    #[test]
    fn failed_prepare_rejects_probe() {
        let listener = bind_loopback();
        let addr = listener.local_addr();

        let probe = thread::spawn(move || connect(addr, 2));

        let err = listener
            .accept_with(|_| -> Result<()> {
                Err(SessionError::InvalidInput("refused".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)));

        // Dropping the half-open session closes the socket before any ack.
        assert!(matches!(
            probe.join().unwrap(),
            Err(SessionError::Protocol(_))
        ));
    }

    #[test]
    fn accepts_sequential_sessions() {
        let listener = bind_loopback();
        let addr = listener.local_addr();

        let probes = thread::spawn(move || {
            let first = connect(addr, 1).unwrap();
            let second = connect_with_config(addr, 2, &HandshakeConfig::default(), false).unwrap();
            (first.channel_count(), second.channel_count())
        });

        let first = listener.accept().unwrap();
        let second = listener.accept().unwrap();
        assert_eq!(first.channel_count(), 1);
        assert_eq!(second.channel_count(), 2);
        assert_eq!(probes.join().unwrap(), (1, 2));
    }
}
