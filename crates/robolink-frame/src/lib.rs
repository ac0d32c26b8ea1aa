//! Length-prefixed message framing for the robot link.
//!
//! Every message on the wire is:
//! - An 8-byte little-endian unsigned payload length
//! - Exactly that many bytes of payload body
//!
//! There is no multiplexing and no stream synchronization marker: one frame
//! occupies the wire until the next length header. No partial reads, no
//! buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, decode_header, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD,
    DEFAULT_READ_CHUNK, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
