use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Args, Subcommand};
use tcpmsg_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use tcpmsg_socket::{Message, Status, StreamConnection, TcpTransport, Transport};
use tcpmsg_transport::{TcpAcceptor, TransportError};

use crate::exit::{status_error, transport_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod info;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept peers and echo every message back.
    Echo(EchoArgs),
    /// Connect and send a single message.
    Send(SendArgs),
    /// Accept peers and print received messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Connect and print the endpoints of the connection.
    Info(InfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Info(args) => info::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to bind (e.g. 127.0.0.1:7400).
    pub bind: SocketAddr,
    /// Largest accepted message payload in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to.
    pub addr: SocketAddr,
    /// JSON payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Wait for one reply message and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set.
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    /// Largest accepted reply payload in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind.
    pub bind: SocketAddr,
    /// Exit after receiving N messages (N >= 1).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub count: Option<usize>,
    /// Largest accepted message payload in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Address to connect to.
    pub addr: SocketAddr,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

/// Connect to `addr`, waiting at most `timeout`.
pub fn connect(
    addr: SocketAddr,
    timeout: Duration,
    max_payload: usize,
) -> CliResult<StreamConnection<TcpTransport>> {
    let config = FrameConfig {
        max_payload_size: max_payload,
    };
    let mut conn = StreamConnection::with_config(TcpTransport::new(), config);

    match conn.connect(addr.ip(), addr.port(), timeout) {
        Status::Done => Ok(conn),
        status => Err(status_error(
            &format!("connect to {addr} failed"),
            status,
            conn.last_error(),
        )),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// How long server loops sleep between polls of an idle socket.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Bind a polling acceptor so server loops can notice a shutdown request.
pub fn bind_polling(addr: SocketAddr) -> CliResult<TcpAcceptor> {
    let acceptor = TcpAcceptor::bind(addr).map_err(|err| transport_error("bind failed", err))?;
    acceptor
        .set_nonblocking(true)
        .map_err(|err| transport_error("bind failed", err))?;
    Ok(acceptor)
}

/// Wait for the next peer and hand it back as a non-blocking connection.
/// Returns `None` once `running` is cleared.
pub fn accept_until_stopped(
    acceptor: &TcpAcceptor,
    config: &FrameConfig,
    running: &AtomicBool,
) -> CliResult<Option<(StreamConnection<TcpTransport>, SocketAddr)>> {
    while running.load(Ordering::SeqCst) {
        match acceptor.accept() {
            Ok((transport, peer)) => {
                let mut conn = StreamConnection::with_config(transport, config.clone());
                conn.set_blocking(false).map_err(|err| {
                    transport_error("accept failed", TransportError::Io(err))
                })?;
                return Ok(Some((conn, peer)));
            }
            Err(TransportError::Accept(err)) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return Err(transport_error("accept failed", err)),
        }
    }
    Ok(None)
}

/// Receive one message on a non-blocking connection, sleeping while the
/// peer is idle. Returns `None` once `running` is cleared.
pub fn receive_until_stopped<T, M>(
    conn: &mut StreamConnection<T>,
    message: &mut M,
    running: &AtomicBool,
) -> Option<Status>
where
    T: Transport,
    M: Message + ?Sized,
{
    while running.load(Ordering::SeqCst) {
        match conn.receive_message(message) {
            Status::NotReady => thread::sleep(POLL_INTERVAL),
            status => return Some(status),
        }
    }
    None
}

/// Send one message on a non-blocking connection, resuming partial sends.
/// Returns `None` once `running` is cleared.
pub fn send_until_stopped<T, M>(
    conn: &mut StreamConnection<T>,
    message: &mut M,
    running: &AtomicBool,
) -> Option<Status>
where
    T: Transport,
    M: Message + ?Sized,
{
    while running.load(Ordering::SeqCst) {
        match conn.send_message(message) {
            Status::NotReady | Status::Partial => thread::sleep(POLL_INTERVAL),
            status => return Some(status),
        }
    }
    None
}
