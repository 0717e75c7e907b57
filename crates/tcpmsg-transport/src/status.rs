use std::fmt;
use std::io::{self, ErrorKind};

/// Outcome of a socket operation.
///
/// Shared by the raw transfer primitives and the message framing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The operation completed.
    Done,
    /// Some but not all bytes were sent; resume with the rest later.
    Partial,
    /// No progress is possible right now (non-blocking mode only).
    NotReady,
    /// The peer closed the connection in an orderly way.
    Disconnected,
    /// Unrecoverable failure; abandon the operation.
    Error,
}

impl Status {
    /// Translate an OS-level I/O error into a status.
    pub fn from_io_error(err: &io::Error) -> Self {
        #[cfg(unix)]
        if let Some(code) = err.raw_os_error() {
            if code == libc::EINPROGRESS {
                return Status::NotReady;
            }
            if code == libc::ENETRESET {
                return Status::Disconnected;
            }
        }

        match err.kind() {
            ErrorKind::WouldBlock => Status::NotReady,
            ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::TimedOut
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe => Status::Disconnected,
            _ => Status::Error,
        }
    }

    /// Whether the caller is expected to retry the operation later.
    pub fn is_retryable(self) -> bool {
        matches!(self, Status::NotReady | Status::Partial)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Done => "done",
            Status::Partial => "partial",
            Status::NotReady => "not-ready",
            Status::Disconnected => "disconnected",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status together with the number of bytes moved by the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub status: Status,
    pub bytes: usize,
}

impl Transfer {
    pub fn new(status: Status, bytes: usize) -> Self {
        Self { status, bytes }
    }

    /// A transfer that moved nothing.
    pub fn empty(status: Status) -> Self {
        Self { status, bytes: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_block_is_not_ready() {
        let err = io::Error::from(ErrorKind::WouldBlock);
        assert_eq!(Status::from_io_error(&err), Status::NotReady);
    }

    #[test]
    fn interrupted_is_an_error() {
        // NotReady is reserved for non-blocking handles; a signal can hit either.
        let err = io::Error::from(ErrorKind::Interrupted);
        assert_eq!(Status::from_io_error(&err), Status::Error);
    }

    #[test]
    fn connection_teardown_kinds_are_disconnected() {
        for kind in [
            ErrorKind::ConnectionAborted,
            ErrorKind::ConnectionReset,
            ErrorKind::TimedOut,
            ErrorKind::NotConnected,
            ErrorKind::BrokenPipe,
        ] {
            let err = io::Error::from(kind);
            assert_eq!(Status::from_io_error(&err), Status::Disconnected, "{kind:?}");
        }
    }

    #[test]
    fn other_errors_are_errors() {
        for kind in [
            ErrorKind::ConnectionRefused,
            ErrorKind::PermissionDenied,
            ErrorKind::InvalidInput,
            ErrorKind::AddrNotAvailable,
        ] {
            let err = io::Error::from(kind);
            assert_eq!(Status::from_io_error(&err), Status::Error, "{kind:?}");
        }
    }

    #[test]
    #[cfg(unix)]
    fn raw_os_codes_translate() {
        let in_progress = io::Error::from_raw_os_error(libc::EINPROGRESS);
        assert_eq!(Status::from_io_error(&in_progress), Status::NotReady);

        let again = io::Error::from_raw_os_error(libc::EAGAIN);
        assert_eq!(Status::from_io_error(&again), Status::NotReady);

        let net_reset = io::Error::from_raw_os_error(libc::ENETRESET);
        assert_eq!(Status::from_io_error(&net_reset), Status::Disconnected);

        let pipe = io::Error::from_raw_os_error(libc::EPIPE);
        assert_eq!(Status::from_io_error(&pipe), Status::Disconnected);

        let already = io::Error::from_raw_os_error(libc::EALREADY);
        assert_eq!(Status::from_io_error(&already), Status::Error);

        let intr = io::Error::from_raw_os_error(libc::EINTR);
        assert_eq!(Status::from_io_error(&intr), Status::Error);

        let bad_fd = io::Error::from_raw_os_error(libc::EBADF);
        assert_eq!(Status::from_io_error(&bad_fd), Status::Error);
    }

    #[test]
    fn retryable_statuses() {
        assert!(Status::NotReady.is_retryable());
        assert!(Status::Partial.is_retryable());
        assert!(!Status::Done.is_retryable());
        assert!(!Status::Disconnected.is_retryable());
        assert!(!Status::Error.is_retryable());
    }

    #[test]
    fn display_names() {
        assert_eq!(Status::NotReady.to_string(), "not-ready");
        assert_eq!(Status::Done.to_string(), "done");
    }
}
