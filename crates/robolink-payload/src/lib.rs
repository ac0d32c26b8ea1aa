//! Payload schemas carried inside robolink frames.
//!
//! The link core treats these as opaque bodies; this crate pins down how each
//! schema is laid out so peers written in other languages interoperate.

pub mod codec;
pub mod error;
pub mod schema;

pub use codec::{decode_payload, encode_payload, TAG_COMMAND, TAG_IMAGE, TAG_TELEMETRY};
pub use error::{PayloadError, Result};
pub use schema::{CommandRecord, ImageFrame, Payload, TelemetryRecord};
