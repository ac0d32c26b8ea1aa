use std::net::SocketAddr;

use robolink_payload::Payload;
use robolink_transport::TcpTransport;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::connection::{Connection, Received, Role, Status};
use crate::error::{LinkError, Result};
use crate::failure::FailureKind;
use crate::session::Session;

/// Server end of the link: listens on one port and serves one peer at a time.
pub struct ServerConnection {
    transport: TcpTransport,
    session: Option<Session>,
    status: Status,
    config: LinkConfig,
}

impl ServerConnection {
    /// Bind and listen on `address:port` with default configuration.
    pub fn bind(address: &str, port: u16) -> Result<Self> {
        Self::bind_with_config(address, port, LinkConfig::default())
    }

    /// Bind and listen with explicit configuration. The connection starts
    /// `Idle`; call [`Connection::wait_for_connection`] to accept a peer.
    pub fn bind_with_config(address: &str, port: u16, config: LinkConfig) -> Result<Self> {
        let transport = TcpTransport::bind(address, port)?;
        Ok(Self {
            transport,
            session: None,
            status: Status::Idle,
            config,
        })
    }

    /// The locally bound address. Useful after binding port `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    fn active(&mut self) -> Result<&mut Session> {
        match (self.status, self.session.as_mut()) {
            (Status::Connected, Some(session)) => Ok(session),
            _ => Err(LinkError::NotConnected),
        }
    }

    fn note_failure(&mut self, err: &LinkError) {
        if matches!(
            err.kind(),
            FailureKind::ConnectionClosed
                | FailureKind::ConnectionTimeout
                | FailureKind::SocketError
        ) {
            self.status = Status::Reconnecting;
        }
    }
}

impl Connection for ServerConnection {
    fn role(&self) -> Role {
        Role::Server
    }

    fn status(&self) -> Status {
        self.status
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().map(Session::peer)
    }

    fn wait_for_connection(&mut self) -> Result<SocketAddr> {
        self.close();
        debug!(addr = %self.local_addr(), "waiting for a peer (blocking)");
        let (stream, peer) = self.transport.accept()?;
        self.session = Some(Session::open(stream, peer, &self.config)?);
        self.status = Status::Connected;
        info!(%peer, "accepted link peer");
        Ok(peer)
    }

    fn send(&mut self, payload: &Payload) -> Result<()> {
        let result = self.active()?.send(payload);
        if let Err(err) = &result {
            warn!(error = %err, kind = %err.kind(), "send failed");
            self.note_failure(err);
        }
        result
    }

    fn receive(&mut self) -> Result<Received> {
        let result = self.active()?.receive();
        match result {
            Ok(payload) => Ok(Received::Payload(payload)),
            Err(err) if err.kind() == FailureKind::ConnectionClosed => {
                warn!(error = %err, "peer closed the connection during receive");
                self.status = Status::Reconnecting;
                self.attempt_reconnection().map(|()| Received::Reconnected)
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(peer = %session.peer(), "closing peer socket");
        }
        self.status = Status::Idle;
    }

    fn attempt_reconnection(&mut self) -> Result<()> {
        info!("lost link peer; caller must wait for a new one");
        self.close();
        Err(LinkError::Closed)
    }

    fn restart(&mut self) -> Result<()> {
        self.wait_for_connection().map(|_| ())
    }

    fn is_desynchronized(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(Session::is_desynchronized)
    }
}
