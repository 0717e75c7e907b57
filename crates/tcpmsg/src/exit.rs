use std::fmt;
use std::io;

use tcpmsg_socket::Status;
use tcpmsg_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => FAILURE,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match &err {
        TransportError::Bind { source, .. } | TransportError::Accept(source) => {
            let mut cli = io_error(context, source);
            if cli.code == INTERNAL {
                cli.code = TRANSPORT_ERROR;
            }
            cli.message = format!("{context}: {err}");
            cli
        }
        TransportError::Io(source) => io_error(context, source),
    }
}

/// Map a non-`Done` connection status to an exit code, consulting the
/// connection's last OS error when there is one.
pub fn status_error(context: &str, status: Status, last_error: Option<&io::Error>) -> CliError {
    match (status, last_error) {
        (Status::Disconnected, _) => {
            CliError::new(FAILURE, format!("{context}: peer disconnected"))
        }
        (Status::Error, Some(err)) => io_error(context, err),
        (Status::Error, None) => CliError::new(TRANSPORT_ERROR, format!("{context}: {status}")),
        (Status::NotReady | Status::Partial, _) => {
            CliError::new(TIMEOUT, format!("{context}: transfer did not complete ({status})"))
        }
        (Status::Done, _) => CliError::new(INTERNAL, format!("{context}: unexpected success")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_deadline_maps_to_timeout() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "connect timed out after 1s");
        let cli = status_error("connect failed", Status::Error, Some(&err));
        assert_eq!(cli.code, TIMEOUT);
        assert!(cli.message.contains("timed out"));
    }

    #[test]
    fn refused_and_disconnected_are_failures() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(
            status_error("connect failed", Status::Error, Some(&refused)).code,
            FAILURE
        );
        assert_eq!(
            status_error("receive failed", Status::Disconnected, None).code,
            FAILURE
        );
    }

    #[test]
    fn oversized_message_is_invalid_data() {
        let err = io::Error::new(io::ErrorKind::InvalidData, "payload too large");
        assert_eq!(
            status_error("receive failed", Status::Error, Some(&err)).code,
            DATA_INVALID
        );
    }

    #[test]
    fn bind_in_use_is_a_transport_error() {
        let err = TransportError::Bind {
            addr: "127.0.0.1:1".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let cli = transport_error("bind failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("127.0.0.1:1"));
    }
}
