use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use robolink_transport::LinkStream;
use tracing::trace;

use crate::codec::{decode_header, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// The header is read exactly, then the body is collected in reads of at most
/// `read_chunk_size` bytes until exactly `length` bytes are held. Nothing past
/// the end of the current frame is ever consumed from the stream.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame body (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends before
    /// a full frame arrives, and `Err(FrameError::InvalidLength)` when the
    /// header names a length above the configured maximum.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        let mut header = [0u8; HEADER_SIZE];
        self.fill(&mut header)?;
        let length = decode_header(&header, self.config.max_payload_size)?;

        // The body grows only as bytes arrive, so a header alone never
        // commits memory for its full claimed length.
        let chunk_size = self.config.read_chunk_size.max(1);
        let mut body = BytesMut::with_capacity(length.min(chunk_size));
        while body.len() < length {
            let start = body.len();
            let end = length.min(start + chunk_size);
            body.resize(end, 0);
            let read = self.read_some(&mut body[start..end])?;
            body.truncate(start + read);
            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }
        }

        trace!(len = length, "read frame");
        Ok(body.freeze())
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            let read = self.read_some(&mut buf[filled..])?;
            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }
            filled += read;
        }
        Ok(())
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }
}

impl FrameReader<LinkStream> {
    /// Create a frame reader for `LinkStream` and apply read timeout from config.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: robolink_transport::TransportError) -> FrameError {
    match err {
        robolink_transport::TransportError::Io(io)
        | robolink_transport::TransportError::Accept(io) => FrameError::Io(io),
        robolink_transport::TransportError::Bind { source, .. }
        | robolink_transport::TransportError::Connect { source, .. }
        | robolink_transport::TransportError::Resolve { source, .. } => FrameError::Io(source),
    }
}
