use std::net::{SocketAddr, TcpListener};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::tcp::TcpTransport;

/// Listening TCP socket producing connected [`TcpTransport`] handles.
pub struct TcpAcceptor {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpAcceptor {
    /// Bind and listen on `addr`. Port 0 picks an ephemeral port.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        let addr = listener
            .local_addr()
            .map_err(|e| TransportError::Bind { addr, source: e })?;

        info!(%addr, "listening on tcp socket");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    ///
    /// The returned handle is in blocking mode.
    pub fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        let transport = TcpTransport::from_std(stream).map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok((transport, peer))
    }

    /// The address this acceptor is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Switch `accept` between waiting for a peer and polling for one.
    ///
    /// A polling `accept` with no peer queued fails with
    /// [`TransportError::Accept`] of kind `WouldBlock`. Accepted handles are
    /// blocking either way.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener
            .set_nonblocking(nonblocking)
            .map_err(TransportError::Io)
    }
}
