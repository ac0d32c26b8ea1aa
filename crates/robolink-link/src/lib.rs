//! Connection management for the robot link.
//!
//! This is the layer application loops talk to. It owns the single peer
//! socket, frames payloads onto it, classifies every I/O failure into a
//! [`FailureKind`], and drives recovery: a server re-accepts, a client
//! reconnects. What to do about a failure is decided by
//! [`policy::handle_failure`], which every application loop shares.

#[cfg(feature = "async")]
pub mod asynchronous;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod failure;
pub mod policy;
pub mod server;
mod session;

#[cfg(feature = "async")]
pub use asynchronous::AsyncConnection;
pub use client::ClientConnection;
pub use config::LinkConfig;
pub use connection::{Connection, Received, Role, Status};
pub use error::{LinkError, Result};
pub use failure::{classify_io, FailureKind};
pub use policy::{handle_failure, Outcome};
pub use server::ServerConnection;
