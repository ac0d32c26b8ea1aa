use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// Listening TCP transport for the server role.
///
/// Binds once at construction and hands out one accepted stream per call to
/// [`TcpTransport::accept`]. Connection attempts that arrive while no accept
/// is pending queue in the kernel backlog until the next accept.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `address:port`.
    ///
    /// Port `0` binds an ephemeral port; read it back with
    /// [`TcpTransport::local_addr`].
    pub fn bind(address: &str, port: u16) -> Result<Self> {
        let display = format!("{address}:{port}");
        let listener =
            TcpListener::bind((address, port)).map_err(|source| TransportError::Bind {
                addr: display.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind {
                addr: display,
                source,
            })?;

        info!(%local_addr, "listening for link peer");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(LinkStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok((LinkStream::from_tcp(stream), peer))
    }

    /// The address this transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Resolve `address:port` to the first socket address it names.
pub fn resolve(address: &str, port: u16) -> Result<SocketAddr> {
    let display = format!("{address}:{port}");
    let mut addrs = (address, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: display.clone(),
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::Resolve {
        addr: display,
        source: std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "address resolved to no socket addresses",
        ),
    })
}

/// Connect to a listening peer, giving up after `timeout` (blocking).
pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<LinkStream> {
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|source| TransportError::Connect { addr, source })?;
    debug!(%addr, "connected to link peer");
    Ok(LinkStream::from_tcp(stream))
}
