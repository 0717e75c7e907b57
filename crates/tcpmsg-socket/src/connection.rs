use std::io::{self, ErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tcpmsg_frame::{FrameConfig, Message, PendingMessage, Reassembly, SendStaging};
use tcpmsg_transport::{Readiness, Status, Transfer, Transport};
use tracing::{debug, trace, warn};

#[cfg(unix)]
use tcpmsg_transport::TcpTransport;

/// A stream connection carrying length-prefixed messages.
///
/// Owns its transport handle, the reassembly state of the incoming message
/// and a reusable staging buffer for outgoing messages. All of it is
/// mutated in place; the type is not meant for concurrent use.
pub struct StreamConnection<T: Transport> {
    transport: T,
    pending: PendingMessage,
    staging: SendStaging,
    config: FrameConfig,
    last_error: Option<io::Error>,
}

#[cfg(unix)]
impl StreamConnection<TcpTransport> {
    /// Create an unconnected TCP connection in blocking mode.
    pub fn new() -> Self {
        Self::with_transport(TcpTransport::new())
    }
}

#[cfg(unix)]
impl Default for StreamConnection<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> StreamConnection<T> {
    /// Wrap a transport handle with default framing configuration.
    pub fn with_transport(transport: T) -> Self {
        Self::with_config(transport, FrameConfig::default())
    }

    /// Wrap a transport handle with explicit framing configuration.
    pub fn with_config(transport: T, config: FrameConfig) -> Self {
        Self {
            transport,
            pending: PendingMessage::new(),
            staging: SendStaging::new(),
            config,
            last_error: None,
        }
    }

    /// Connect to `address:port`, dropping any existing connection first.
    ///
    /// A zero `timeout` issues one connect attempt in the current blocking
    /// mode. A positive `timeout` switches the handle to non-blocking mode
    /// for the attempt, waits at most `timeout` for it to resolve, and
    /// restores the caller's mode on every return path.
    pub fn connect(&mut self, address: IpAddr, port: u16, timeout: Duration) -> Status {
        self.disconnect();

        let remote = SocketAddr::new(address, port);
        if let Err(err) = self.transport.create(&remote) {
            warn!(%remote, error = %err, "failed to create socket");
            self.last_error = Some(err);
            return Status::Error;
        }

        let status = if timeout.is_zero() {
            match self.transport.connect_raw(&remote) {
                Ok(()) => Status::Done,
                Err(err) => self.translate(err),
            }
        } else {
            self.connect_with_deadline(&remote, timeout)
        };

        debug!(%remote, ?timeout, %status, "connect finished");
        status
    }

    fn connect_with_deadline(&mut self, remote: &SocketAddr, timeout: Duration) -> Status {
        let blocking = self.transport.is_blocking();

        let status = match self.transport.set_blocking(false) {
            Ok(()) => self.attempt_connect(remote, timeout),
            Err(err) => {
                self.last_error = Some(err);
                Status::Error
            }
        };

        if blocking {
            if let Err(err) = self.transport.set_blocking(true) {
                warn!(error = %err, "failed to restore blocking mode after connect");
            }
        }

        status
    }

    fn attempt_connect(&mut self, remote: &SocketAddr, timeout: Duration) -> Status {
        match self.transport.connect_raw(remote) {
            Ok(()) => return Status::Done,
            Err(err) => {
                let status = Status::from_io_error(&err);
                if status != Status::NotReady {
                    self.last_error = Some(err);
                    return status;
                }
            }
        }

        match self.transport.wait_writable(timeout) {
            // Writable means the attempt resolved; only a retrievable peer
            // address tells acceptance apart from refusal.
            Ok(Readiness::Ready) if self.transport.remote_endpoint().is_ok() => Status::Done,
            Ok(Readiness::Ready) => match self.transport.take_error() {
                Ok(Some(err)) => self.translate(err),
                Ok(None) => {
                    self.last_error = Some(io::Error::from(ErrorKind::NotConnected));
                    Status::Error
                }
                Err(err) => {
                    self.last_error = Some(err);
                    Status::Error
                }
            },
            Ok(Readiness::TimedOut) => {
                debug!(%remote, ?timeout, "connect deadline elapsed");
                self.last_error = Some(io::Error::new(
                    ErrorKind::TimedOut,
                    format!("connect timed out after {timeout:?}"),
                ));
                Status::Error
            }
            Err(err) => {
                self.last_error = Some(err);
                Status::Error
            }
        }
    }

    /// Close the handle and forget any partially received message.
    ///
    /// Safe to call repeatedly and on a connection that never connected.
    pub fn disconnect(&mut self) {
        if self.transport.is_valid() {
            debug!("disconnecting");
        }
        self.transport.close();
        self.pending = PendingMessage::new();
    }

    /// Local port of the live handle, or 0.
    pub fn local_port(&self) -> u16 {
        if !self.transport.is_valid() {
            return 0;
        }
        self.transport
            .local_endpoint()
            .map(|addr| addr.port())
            .unwrap_or(0)
    }

    /// Address of the connected peer, if any.
    pub fn remote_address(&self) -> Option<IpAddr> {
        if !self.transport.is_valid() {
            return None;
        }
        self.transport.remote_endpoint().ok().map(|addr| addr.ip())
    }

    /// Port of the connected peer, or 0.
    pub fn remote_port(&self) -> u16 {
        if !self.transport.is_valid() {
            return 0;
        }
        self.transport
            .remote_endpoint()
            .map(|addr| addr.port())
            .unwrap_or(0)
    }

    pub fn set_blocking(&mut self, blocking: bool) -> io::Result<()> {
        self.transport.set_blocking(blocking)
    }

    pub fn is_blocking(&self) -> bool {
        self.transport.is_blocking()
    }

    /// Send all of `data`, discarding the byte count.
    ///
    /// In non-blocking mode a `Partial` result leaves the caller unable to
    /// tell where to resume; use [`send_all`](Self::send_all) there.
    pub fn send(&mut self, data: &[u8]) -> Status {
        if !self.transport.is_blocking() {
            warn!("partial sends might not be handled properly in non-blocking mode");
        }
        self.send_all(data).status
    }

    /// Send `data`, looping until every byte is accepted or an error occurs.
    ///
    /// Would-block after some progress is `Partial` (resume with
    /// `&data[transfer.bytes..]`); would-block before any progress is
    /// `NotReady`. Empty input is rejected as `Error` without any I/O.
    pub fn send_all(&mut self, data: &[u8]) -> Transfer {
        send_all(&mut self.transport, &mut self.last_error, data)
    }

    /// Issue exactly one receive call into `buf`.
    pub fn receive_chunk(&mut self, buf: &mut [u8]) -> Transfer {
        receive_chunk(&mut self.transport, &mut self.last_error, buf)
    }

    /// Send one message as prefix + payload.
    ///
    /// On `Partial` the message's resume offset is advanced so calling
    /// again with the same message continues exactly where this call
    /// stopped; on `Done` it is reset to 0. Other statuses leave it alone.
    pub fn send_message<M: Message + ?Sized>(&mut self, message: &mut M) -> Status {
        let payload = message.on_send();
        if let Err(err) = self.config.check_payload_size(payload.len()) {
            warn!(error = %err, "refusing to send message");
            return Status::Error;
        }

        let block_len = match self.staging.stage(payload) {
            Ok(block) => block.len(),
            Err(err) => {
                warn!(error = %err, "refusing to send message");
                return Status::Error;
            }
        };

        let offset = message.resume_offset();
        if offset >= block_len {
            warn!(offset, block_len, "resume offset lies beyond the staged message");
            self.staging.release();
            message.set_resume_offset(0);
            return Status::Error;
        }

        let transfer = send_all(
            &mut self.transport,
            &mut self.last_error,
            &self.staging.staged()[offset..],
        );
        self.staging.release();

        match transfer.status {
            Status::Partial => message.set_resume_offset(offset + transfer.bytes),
            Status::Done => message.set_resume_offset(0),
            _ => {}
        }

        trace!(offset, sent = transfer.bytes, status = %transfer.status, "message send");
        transfer.status
    }

    /// Receive one message into `message`.
    ///
    /// Resumable: anything other than `Done` keeps the bytes gathered so
    /// far, and the next call continues from there. `message` is cleared
    /// on entry and filled only once the whole payload has arrived.
    pub fn receive_message<M: Message + ?Sized>(&mut self, message: &mut M) -> Status {
        message.clear();

        let Self {
            transport,
            pending,
            config,
            last_error,
            ..
        } = self;

        match pending.resume(config, |buf| receive_chunk(transport, last_error, buf)) {
            Ok(Reassembly::Complete(payload)) => {
                if !payload.is_empty() {
                    message.on_receive(&payload);
                }
                Status::Done
            }
            Ok(Reassembly::Pending(status)) => status,
            Err(err) => {
                warn!(error = %err, "discarding incoming message");
                *last_error = Some(io::Error::new(ErrorKind::InvalidData, err));
                Status::Error
            }
        }
    }

    /// Reassembly state of the message currently being received.
    pub fn pending_message(&self) -> &PendingMessage {
        &self.pending
    }

    /// Most recent OS-level error seen by this connection, for diagnostics.
    pub fn last_error(&self) -> Option<&io::Error> {
        self.last_error.as_ref()
    }

    /// Current framing configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Update the maximum payload size for subsequent sends and receives.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn translate(&mut self, err: io::Error) -> Status {
        let status = Status::from_io_error(&err);
        if !status.is_retryable() {
            self.last_error = Some(err);
        }
        status
    }
}

impl<T: Transport> Drop for StreamConnection<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for StreamConnection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("transport", &self.transport)
            .field("pending", &self.pending.state())
            .field("max_payload_size", &self.config.max_payload_size)
            .finish()
    }
}

fn send_all<T: Transport>(
    transport: &mut T,
    last_error: &mut Option<io::Error>,
    data: &[u8],
) -> Transfer {
    if data.is_empty() {
        warn!("cannot send data over the network (no data to send)");
        return Transfer::empty(Status::Error);
    }

    let mut sent = 0usize;
    while sent < data.len() {
        match transport.send_raw(&data[sent..]) {
            Ok(0) => return Transfer::new(Status::Disconnected, sent),
            Ok(n) => {
                sent += n.min(data.len() - sent);
                trace!(sent, total = data.len(), "send progress");
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                let status = Status::from_io_error(&err);
                if status == Status::NotReady {
                    let status = if sent > 0 { Status::Partial } else { Status::NotReady };
                    return Transfer::new(status, sent);
                }
                *last_error = Some(err);
                return Transfer::new(status, sent);
            }
        }
    }

    Transfer::new(Status::Done, sent)
}

fn receive_chunk<T: Transport>(
    transport: &mut T,
    last_error: &mut Option<io::Error>,
    buf: &mut [u8],
) -> Transfer {
    if buf.is_empty() {
        warn!("cannot receive data from the network (the destination buffer is empty)");
        return Transfer::empty(Status::Error);
    }

    match transport.recv_raw(buf) {
        Ok(0) => Transfer::empty(Status::Disconnected),
        Ok(n) => Transfer::new(Status::Done, n.min(buf.len())),
        Err(err) => {
            let status = Status::from_io_error(&err);
            if !status.is_retryable() {
                *last_error = Some(err);
            }
            Transfer::empty(status)
        }
    }
}
