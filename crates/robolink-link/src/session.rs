use std::net::SocketAddr;

use robolink_frame::{FrameError, FrameReader, FrameWriter};
use robolink_payload::{decode_payload, encode_payload, Payload};
use robolink_transport::LinkStream;
use tracing::{debug, warn};

use crate::config::LinkConfig;
use crate::error::Result;

/// Framed reader/writer pair over the one active peer socket.
pub(crate) struct Session {
    reader: FrameReader<LinkStream>,
    writer: FrameWriter<LinkStream>,
    peer: SocketAddr,
    desynchronized: bool,
}

impl Session {
    pub(crate) fn open(stream: LinkStream, peer: SocketAddr, config: &LinkConfig) -> Result<Self> {
        stream.set_nodelay(config.nodelay)?;
        let reader_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_link(reader_stream, config.frame.clone())?;
        let writer = FrameWriter::with_config_link(stream, config.frame.clone())?;

        Ok(Self {
            reader,
            writer,
            peer,
            desynchronized: false,
        })
    }

    pub(crate) fn send(&mut self, payload: &Payload) -> Result<()> {
        let body = encode_payload(payload)?;
        self.writer.send(&body)?;
        debug!(peer = %self.peer, kind = payload.kind(), len = body.len(), "sent payload");
        Ok(())
    }

    pub(crate) fn receive(&mut self) -> Result<Payload> {
        let body = match self.reader.read_frame() {
            Ok(body) => body,
            Err(err @ FrameError::InvalidLength { .. }) => {
                warn!(
                    peer = %self.peer,
                    error = %err,
                    "bad length header; stream has no usable frame boundary"
                );
                self.desynchronized = true;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        match decode_payload(&body) {
            Ok(payload) => {
                debug!(
                    peer = %self.peer,
                    kind = payload.kind(),
                    len = body.len(),
                    "received payload"
                );
                Ok(payload)
            }
            Err(err) => {
                warn!(
                    peer = %self.peer,
                    len = body.len(),
                    error = %err,
                    "discarding undecodable frame"
                );
                Err(err.into())
            }
        }
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn is_desynchronized(&self) -> bool {
        self.desynchronized
    }

    pub(crate) fn shutdown(&self) {
        if let Err(err) = self.writer.get_ref().shutdown() {
            debug!(peer = %self.peer, error = %err, "peer socket shutdown failed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
