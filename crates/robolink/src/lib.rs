//! Framed TCP link between a telepresence robot and its operator.
//!
//! One robot process and one operator process exchange camera frames,
//! power telemetry and motor commands over plain TCP. Every object travels
//! in a length-prefixed frame; lost peers are re-accepted (server) or
//! redialed (client) under a shared failure policy.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP listener and stream wrapper
//! - [`frame`]: Length-prefixed framing codec
//! - [`payload`]: Image, telemetry and command schemas and their body encoding
//! - [`link`]: Connections, failure classification and recovery policy

/// Re-export transport types.
pub mod transport {
    pub use robolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use robolink_frame::*;
}

/// Re-export payload types.
pub mod payload {
    pub use robolink_payload::*;
}

/// Re-export link types.
pub mod link {
    pub use robolink_link::*;
}
