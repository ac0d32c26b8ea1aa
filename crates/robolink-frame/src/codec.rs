use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: payload length as a little-endian `u64`.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Default upper bound on a single body read.
pub const DEFAULT_READ_CHUNK: usize = 4096;

/// Encode a body into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────┐
/// │ Length (8B LE)   │ Body             │
/// │ unsigned 64-bit  │ (Length bytes)   │
/// └──────────────────┴──────────────────┘
/// ```
pub fn encode_frame(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_u64_le(body.len() as u64);
    dst.put_slice(body);
    Ok(())
}

/// Decode a length header, rejecting lengths above `max_payload`.
pub fn decode_header(header: &[u8; HEADER_SIZE], max_payload: usize) -> Result<usize> {
    let length = u64::from_le_bytes(*header);
    match usize::try_from(length) {
        Ok(len) if len <= max_payload => Ok(len),
        _ => Err(FrameError::InvalidLength {
            length,
            max: max_payload,
        }),
    }
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let Some(header) = src.get(..HEADER_SIZE) else {
        return Ok(None);
    };
    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(header);
    let body_len = decode_header(&raw, max_payload)?;

    if src.len() < HEADER_SIZE + body_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(body_len).freeze()))
}

/// Configuration for framed reads and writes.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Largest single read issued while collecting a body. Default: 4096.
    pub read_chunk_size: usize,
    /// Read timeout for blocking operations. Default: none.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations. Default: none.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_chunk_size: DEFAULT_READ_CHUNK,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
