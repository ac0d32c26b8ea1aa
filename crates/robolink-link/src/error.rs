use std::net::SocketAddr;
use std::time::Duration;

use crate::connection::Role;
use crate::failure::{classify_frame, classify_transport, FailureKind};

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] robolink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] robolink_frame::FrameError),

    /// The frame body did not hold a valid payload.
    #[error("payload error: {0}")]
    Payload(#[from] robolink_payload::PayloadError),

    /// The peer went away and this side is waiting to be given a new one.
    #[error("peer closed the connection")]
    Closed,

    /// Send or receive was attempted without an active peer.
    #[error("no active peer connection")]
    NotConnected,

    /// A reconnect attempt ran out of time.
    #[error("reconnect to {addr} timed out after {timeout:?}")]
    ReconnectTimeout { addr: SocketAddr, timeout: Duration },

    /// The operation has no meaning for this connection role.
    #[error("{operation} is not applicable to a {role} connection")]
    NotApplicable {
        operation: &'static str,
        role: Role,
    },

    /// The blocking task driving the connection panicked or was cancelled.
    #[cfg(feature = "async")]
    #[error("connection task failed: {0}")]
    TaskFailed(String),
}

impl LinkError {
    /// Classify this error into the closed failure taxonomy.
    ///
    /// Never returns [`FailureKind::Reconnected`].
    pub fn kind(&self) -> FailureKind {
        match self {
            LinkError::Transport(err) => classify_transport(err),
            LinkError::Frame(err) => classify_frame(err),
            LinkError::Payload(_) => FailureKind::DecodeError,
            LinkError::Closed | LinkError::NotConnected => FailureKind::ConnectionClosed,
            LinkError::ReconnectTimeout { .. } => FailureKind::ConnectionTimeout,
            LinkError::NotApplicable { .. } => FailureKind::SocketError,
            #[cfg(feature = "async")]
            LinkError::TaskFailed(_) => FailureKind::SocketError,
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
