use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Instant;

use robolink_payload::Payload;
use robolink_transport::{connect, resolve, TransportError};
use tracing::{debug, error, info, warn};

use crate::config::LinkConfig;
use crate::connection::{Connection, Received, Role, Status};
use crate::error::{LinkError, Result};
use crate::failure::FailureKind;
use crate::session::Session;

/// Client end of the link: dials one remote address and redials it on loss.
pub struct ClientConnection {
    remote: SocketAddr,
    session: Option<Session>,
    status: Status,
    config: LinkConfig,
}

impl ClientConnection {
    /// Connect to `address:port` with default configuration.
    pub fn connect(address: &str, port: u16) -> Result<Self> {
        Self::connect_with_config(address, port, LinkConfig::default())
    }

    /// Connect with explicit configuration.
    ///
    /// Makes a single attempt bounded by `config.connect_timeout`. Failure here
    /// is returned as-is; there is no retry at open time.
    pub fn connect_with_config(address: &str, port: u16, config: LinkConfig) -> Result<Self> {
        let remote = resolve(address, port)?;
        let stream = match connect(remote, config.connect_timeout) {
            Ok(stream) => stream,
            Err(err) => {
                error!(%remote, error = %err, "could not connect to link server");
                return Err(err.into());
            }
        };
        let session = Session::open(stream, remote, &config)?;
        info!(%remote, "connected to link server");

        Ok(Self {
            remote,
            session: Some(session),
            status: Status::Connected,
            config,
        })
    }

    /// The server address this client dials.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
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

/// Errors that mean "nobody is listening yet" rather than a broken host.
fn is_unreachable(err: &TransportError) -> bool {
    matches!(
        err.io_error().kind(),
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkUnreachable
    )
}

impl Connection for ClientConnection {
    fn role(&self) -> Role {
        Role::Client
    }

    fn status(&self) -> Status {
        self.status
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().map(Session::peer)
    }

    fn wait_for_connection(&mut self) -> Result<SocketAddr> {
        debug!("wait_for_connection called on a client connection; ignoring");
        Err(LinkError::NotApplicable {
            operation: "wait_for_connection",
            role: Role::Client,
        })
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
                warn!(error = %err, "server closed the connection during receive");
                self.status = Status::Reconnecting;
                match self.attempt_reconnection() {
                    Ok(()) => Ok(Received::Reconnected),
                    Err(err) => {
                        error!(error = %err, kind = %err.kind(), "unable to reconnect after retry");
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(peer = %session.peer(), "closing server socket");
        }
        self.status = Status::Idle;
    }

    fn attempt_reconnection(&mut self) -> Result<()> {
        info!(remote = %self.remote, "reconnect requested; attempting to reconnect");
        self.session = None;
        self.status = Status::Reconnecting;

        let window = self.config.connect_timeout;
        let deadline = Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(remote = %self.remote, ?window, "server did not respond in time");
                return Err(LinkError::ReconnectTimeout {
                    addr: self.remote,
                    timeout: window,
                });
            }

            match connect(self.remote, remaining) {
                Ok(stream) => {
                    self.session = Some(Session::open(stream, self.remote, &self.config)?);
                    self.status = Status::Connected;
                    info!(remote = %self.remote, "reconnected");
                    return Ok(());
                }
                Err(err) if err.io_error().kind() == ErrorKind::TimedOut => continue,
                Err(err) if is_unreachable(&err) => {
                    debug!(remote = %self.remote, error = %err, "server unreachable; retrying");
                    let pause = self
                        .config
                        .reconnect_interval
                        .min(deadline.saturating_duration_since(Instant::now()));
                    std::thread::sleep(pause);
                }
                Err(err) => {
                    error!(remote = %self.remote, error = %err, "failed to open connection");
                    return Err(err.into());
                }
            }
        }
    }

    fn restart(&mut self) -> Result<()> {
        self.attempt_reconnection()
    }

    fn is_desynchronized(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(Session::is_desynchronized)
    }
}
