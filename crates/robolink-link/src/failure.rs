//! Failure classification.
//!
//! Every error the link reports maps into one [`FailureKind`]. The mapping
//! from OS-level errors is:
//!
//! | I/O error kind                                              | Failure           |
//! |-------------------------------------------------------------|-------------------|
//! | `TimedOut`, `WouldBlock`                                    | ConnectionTimeout |
//! | `BrokenPipe`, `ConnectionReset`, `ConnectionAborted`, `UnexpectedEof`, `NotConnected` | ConnectionClosed |
//! | anything else                                               | SocketError       |

use std::fmt;
use std::io::{self, ErrorKind};

use robolink_frame::FrameError;
use robolink_transport::TransportError;

/// Classified outcome of a link operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The peer terminated the session.
    ConnectionClosed,
    /// A connect, reconnect, or timed I/O operation exceeded its bound.
    ConnectionTimeout,
    /// Unclassified OS-level socket failure. No recovery path exists.
    SocketError,
    /// One frame's header or body failed to parse.
    DecodeError,
    /// Recovery re-established the link. Not an error.
    Reconnected,
}

impl FailureKind {
    /// Whether this kind reports something going wrong.
    ///
    /// `Reconnected` is a successful recovery and is never a failure.
    pub fn is_failure(self) -> bool {
        !matches!(self, FailureKind::Reconnected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::ConnectionClosed => "connection_closed",
            FailureKind::ConnectionTimeout => "connection_timeout",
            FailureKind::SocketError => "socket_error",
            FailureKind::DecodeError => "decode_error",
            FailureKind::Reconnected => "reconnected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an OS-level I/O error to a failure kind.
pub fn classify_io(err: &io::Error) -> FailureKind {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => FailureKind::ConnectionTimeout,
        ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::UnexpectedEof
        | ErrorKind::NotConnected => FailureKind::ConnectionClosed,
        _ => FailureKind::SocketError,
    }
}

pub(crate) fn classify_frame(err: &FrameError) -> FailureKind {
    match err {
        FrameError::Io(io) => classify_io(io),
        FrameError::ConnectionClosed => FailureKind::ConnectionClosed,
        FrameError::InvalidLength { .. } | FrameError::PayloadTooLarge { .. } => {
            FailureKind::DecodeError
        }
    }
}

pub(crate) fn classify_transport(err: &TransportError) -> FailureKind {
    classify_io(err.io_error())
}
