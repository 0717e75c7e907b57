use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Result of waiting for a handle to become writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The handle became writable before the deadline.
    Ready,
    /// The deadline elapsed first.
    TimedOut,
}

/// A raw stream transport handle.
///
/// Implementations own exactly one OS-level endpoint at a time. The
/// blocking flag belongs to the handle object, not to the socket: it
/// survives `close()` and is applied to every socket created afterwards.
///
/// Raw operations report OS conditions as `io::Error`; translating them
/// into a [`Status`](crate::Status) is the caller's job. Operations on an
/// invalid handle must fail rather than panic.
pub trait Transport {
    /// Allocate a fresh socket suitable for reaching `remote`.
    ///
    /// Any previously open socket is closed first.
    fn create(&mut self, remote: &SocketAddr) -> io::Result<()>;

    /// Close the socket. Idempotent.
    fn close(&mut self);

    /// Whether a socket is currently open.
    fn is_valid(&self) -> bool;

    /// Switch between blocking and non-blocking mode.
    fn set_blocking(&mut self, blocking: bool) -> io::Result<()>;

    fn is_blocking(&self) -> bool;

    /// Issue a single connect attempt.
    fn connect_raw(&mut self, remote: &SocketAddr) -> io::Result<()>;

    /// Issue a single send call; returns the number of bytes accepted.
    fn send_raw(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Issue a single receive call; `Ok(0)` means orderly close.
    fn recv_raw(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn local_endpoint(&self) -> io::Result<SocketAddr>;

    fn remote_endpoint(&self) -> io::Result<SocketAddr>;

    /// Take the pending socket-level error (`SO_ERROR`), if any.
    fn take_error(&self) -> io::Result<Option<io::Error>>;

    /// Wait up to `timeout` for the socket to become writable.
    fn wait_writable(&mut self, timeout: Duration) -> io::Result<Readiness>;
}
