//! Blocking TCP transport for the robot link.
//!
//! This is the lowest layer of robolink. It owns sockets and nothing else:
//! - [`TcpTransport`] binds a listening socket and accepts peers
//! - [`connect`] opens an outbound stream bounded by a timeout
//!
//! Everything above builds on the [`LinkStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::{connect, resolve, TcpTransport};
