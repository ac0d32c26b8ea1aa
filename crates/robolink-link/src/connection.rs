use std::fmt;
use std::net::SocketAddr;

use robolink_payload::Payload;

use crate::error::Result;

/// Which end of the link a connection plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Binds, listens, and accepts exactly one peer at a time.
    Server,
    /// Dials a single remote address.
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// Connection lifecycle state. Send and receive require `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No peer socket.
    Idle,
    /// Exactly one live peer socket.
    Connected,
    /// A transport failure was seen and recovery has not completed.
    Reconnecting,
}

/// Result of a successful receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    /// A complete, decoded payload.
    Payload(Payload),
    /// The peer dropped and recovery re-established the link before any
    /// payload arrived. The caller may resend whatever was in flight.
    Reconnected,
}

/// Capability set shared by server and client connections.
///
/// All operations block the calling thread. The connection never retries on
/// its own; failures are returned classified (see [`crate::LinkError::kind`])
/// and the caller decides, usually via [`crate::policy::handle_failure`].
pub trait Connection {
    /// The role this connection was opened with.
    fn role(&self) -> Role;

    /// Current lifecycle state.
    fn status(&self) -> Status;

    /// Address of the active peer, if any.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Block until a peer connects. Server only; a client returns
    /// [`crate::LinkError::NotApplicable`] and nothing changes.
    fn wait_for_connection(&mut self) -> Result<SocketAddr>;

    /// Frame and write one payload, blocking until written or failed.
    fn send(&mut self, payload: &Payload) -> Result<()>;

    /// Read and decode one payload, blocking until it arrives.
    ///
    /// If the peer closes the stream, this hands off to
    /// [`Connection::attempt_reconnection`] and reports its result.
    fn receive(&mut self) -> Result<Received>;

    /// Release the active peer socket. Safe to call repeatedly.
    fn close(&mut self);

    /// One recovery step after the link broke.
    ///
    /// A client reconnects to its remote address within the connect timeout.
    /// A server drops the stale peer and returns [`crate::LinkError::Closed`]
    /// so the caller can wait for the next peer.
    fn attempt_reconnection(&mut self) -> Result<()>;

    /// Bring the link back to `Connected`: a server re-accepts (blocking), a
    /// client reconnects.
    fn restart(&mut self) -> Result<()>;

    /// Whether a bad length header left the byte stream without a usable
    /// frame boundary.
    fn is_desynchronized(&self) -> bool;
}
