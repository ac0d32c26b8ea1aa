use std::fmt;
use std::io;

use robolink_link::{FailureKind, LinkError};
use robolink_transport::TransportError;

// Process exit codes. Scripts supervising the robot rely on these.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Exit code for a link failure that the policy could not recover from.
pub fn code_for(kind: FailureKind) -> i32 {
    match kind {
        FailureKind::ConnectionClosed => FAILURE,
        FailureKind::ConnectionTimeout => TIMEOUT,
        FailureKind::SocketError => TRANSPORT_ERROR,
        FailureKind::DecodeError => DATA_INVALID,
        FailureKind::Reconnected => INTERNAL,
    }
}

pub fn fatal(context: &str, kind: FailureKind) -> CliError {
    CliError::new(code_for(kind), format!("{context}: unrecoverable {kind}"))
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    let code = match &err {
        LinkError::NotApplicable { .. } => USAGE,
        LinkError::Transport(TransportError::Resolve { .. }) => USAGE,
        LinkError::Transport(inner)
            if inner.io_error().kind() == io::ErrorKind::PermissionDenied =>
        {
            PERMISSION_DENIED
        }
        other => code_for(other.kind()),
    };
    CliError::new(code, format!("{context}: {err}"))
}
