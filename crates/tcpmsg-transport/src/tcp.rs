use std::io::{self, ErrorKind, Read};
use std::net::{SocketAddr, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, warn};

use crate::traits::{Readiness, Transport};

// Keeps a send to a closed peer from raising SIGPIPE; the call fails with EPIPE instead.
#[cfg(target_os = "linux")]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(target_os = "linux"))]
const SEND_FLAGS: libc::c_int = 0;

/// TCP transport handle backed by a `socket2` socket.
///
/// Starts out invalid (no socket) and in blocking mode. Every socket it
/// creates or adopts has Nagle's algorithm disabled.
pub struct TcpTransport {
    socket: Option<Socket>,
    blocking: bool,
}

impl TcpTransport {
    /// Create an invalid handle in blocking mode.
    pub fn new() -> Self {
        Self {
            socket: None,
            blocking: true,
        }
    }

    /// Adopt an already-connected stream (e.g. one returned by `accept`).
    pub fn from_std(stream: TcpStream) -> io::Result<Self> {
        let socket = Socket::from(stream);
        socket.set_nonblocking(false)?;
        configure(&socket);
        Ok(Self {
            socket: Some(socket),
            blocking: true,
        })
    }

    fn socket(&self) -> io::Result<&Socket> {
        self.socket.as_ref().ok_or_else(closed_handle)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    fn create(&mut self, remote: &SocketAddr) -> io::Result<()> {
        self.close();

        let socket = Socket::new(Domain::for_address(*remote), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(!self.blocking)?;
        configure(&socket);

        debug!(%remote, blocking = self.blocking, "created tcp socket");
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!(fd = socket.as_raw_fd(), "closing tcp socket");
            drop(socket);
        }
    }

    fn is_valid(&self) -> bool {
        self.socket.is_some()
    }

    fn set_blocking(&mut self, blocking: bool) -> io::Result<()> {
        self.blocking = blocking;
        match &self.socket {
            Some(socket) => socket.set_nonblocking(!blocking),
            None => Ok(()),
        }
    }

    fn is_blocking(&self) -> bool {
        self.blocking
    }

    fn connect_raw(&mut self, remote: &SocketAddr) -> io::Result<()> {
        self.socket()?.connect(&SockAddr::from(*remote))
    }

    fn send_raw(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket()?.send_with_flags(buf, SEND_FLAGS)
    }

    fn recv_raw(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut socket = self.socket()?;
        socket.read(buf)
    }

    fn local_endpoint(&self) -> io::Result<SocketAddr> {
        inet_addr(self.socket()?.local_addr()?)
    }

    fn remote_endpoint(&self) -> io::Result<SocketAddr> {
        inet_addr(self.socket()?.peer_addr()?)
    }

    fn take_error(&self) -> io::Result<Option<io::Error>> {
        self.socket()?.take_error()
    }

    fn wait_writable(&mut self, timeout: Duration) -> io::Result<Readiness> {
        let mut pollfd = libc::pollfd {
            fd: self.socket()?.as_raw_fd(),
            events: libc::POLLOUT,
            revents: 0,
        };

        // SAFETY: `pollfd` is a valid, writable array of exactly one entry and
        // its descriptor is owned by `self.socket` for the duration of the call.
        let rc = unsafe { libc::poll(&mut pollfd, 1, poll_timeout_millis(timeout)) };

        match rc {
            rc if rc < 0 => Err(io::Error::last_os_error()),
            0 => Ok(Readiness::TimedOut),
            _ => Ok(Readiness::Ready),
        }
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("fd", &self.socket.as_ref().map(|socket| socket.as_raw_fd()))
            .field("blocking", &self.blocking)
            .finish()
    }
}

fn closed_handle() -> io::Error {
    io::Error::from_raw_os_error(libc::EBADF)
}

fn inet_addr(addr: SockAddr) -> io::Result<SocketAddr> {
    addr.as_socket()
        .ok_or_else(|| io::Error::new(ErrorKind::Unsupported, "endpoint is not an inet address"))
}

/// Round up to whole milliseconds so a sub-millisecond deadline still waits.
fn poll_timeout_millis(timeout: Duration) -> libc::c_int {
    let millis = timeout.as_nanos().div_ceil(1_000_000);
    millis.min(libc::c_int::MAX as u128) as libc::c_int
}

fn configure(socket: &Socket) {
    if let Err(err) = set_socket_flag(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY) {
        warn!(error = %err, "failed to disable nagle algorithm");
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    if let Err(err) = set_socket_flag(socket, libc::SOL_SOCKET, libc::SO_NOSIGPIPE) {
        warn!(error = %err, "failed to disable SIGPIPE on socket");
    }
}

fn set_socket_flag(socket: &Socket, level: libc::c_int, name: libc::c_int) -> io::Result<()> {
    let enabled: libc::c_int = 1;

    // SAFETY: `enabled` is a valid readable c_int for the provided length, and
    // the descriptor is an open socket owned by `socket`.
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            level,
            name,
            (&enabled as *const libc::c_int).cast::<libc::c_void>(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
