use bytes::{Bytes, BytesMut};
use tcpmsg_transport::{Status, Transfer};
use tracing::{trace, warn};

use crate::codec::{decode_prefix, FrameConfig, PREFIX_SIZE};
use crate::error::Result;

/// Size of the scratch buffer used for payload-phase receive calls.
pub const RECEIVE_CHUNK_SIZE: usize = 1024;

/// Where reassembly of the current incoming message stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    /// `received` of the 4 prefix bytes have arrived.
    AwaitingPrefix { received: usize },
    /// The prefix is complete; `received` of `declared` payload bytes have arrived.
    AwaitingPayload { declared: usize, received: usize },
}

/// Outcome of one [`PendingMessage::resume`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembly {
    /// A full message arrived; the pending state is empty again.
    Complete(Bytes),
    /// A chunk call returned something other than `Done`. Partial state is
    /// kept for the next call.
    Pending(Status),
}

/// Incoming message reassembly state, persisted across receive calls.
///
/// Payload bytes are only accepted once all four prefix bytes are in, and
/// the prefix never changes afterwards for the current message. Storage
/// grows with what actually arrives; it is never sized from the declared
/// length up front.
#[derive(Debug, Default)]
pub struct PendingMessage {
    prefix: [u8; PREFIX_SIZE],
    prefix_received: usize,
    payload: BytesMut,
}

impl PendingMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReceiveState {
        match self.declared_len() {
            None => ReceiveState::AwaitingPrefix {
                received: self.prefix_received,
            },
            Some(declared) => ReceiveState::AwaitingPayload {
                declared: declared as usize,
                received: self.payload.len(),
            },
        }
    }

    /// True when no byte of a next message has arrived yet.
    pub fn is_empty(&self) -> bool {
        self.prefix_received == 0 && self.payload.is_empty()
    }

    pub fn prefix_received(&self) -> usize {
        self.prefix_received
    }

    /// The declared payload length, once the prefix is complete.
    pub fn declared_len(&self) -> Option<u32> {
        (self.prefix_received == PREFIX_SIZE).then(|| decode_prefix(self.prefix))
    }

    /// Payload bytes accumulated so far for the current message.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..]
    }

    /// Drive reassembly forward using `receive_chunk` for raw input.
    ///
    /// `receive_chunk` is called with a buffer no larger than the bytes
    /// still missing (and never larger than [`RECEIVE_CHUNK_SIZE`] in the
    /// payload phase); it must perform at most one transport receive.
    ///
    /// A declared length above `config.max_payload_size` fails with
    /// `FrameError::PayloadTooLarge` before any payload byte is read, and
    /// the pending state is discarded.
    pub fn resume<F>(&mut self, config: &FrameConfig, mut receive_chunk: F) -> Result<Reassembly>
    where
        F: FnMut(&mut [u8]) -> Transfer,
    {
        while self.prefix_received < PREFIX_SIZE {
            let wanted = PREFIX_SIZE - self.prefix_received;
            let transfer = receive_chunk(&mut self.prefix[self.prefix_received..]);
            if transfer.status != Status::Done {
                return Ok(Reassembly::Pending(transfer.status));
            }
            self.prefix_received += transfer.bytes.min(wanted);
            trace!(received = self.prefix_received, "length prefix progress");
        }

        let declared = decode_prefix(self.prefix) as usize;
        if let Err(err) = config.check_payload_size(declared) {
            warn!(declared, max = config.max_payload_size, "rejecting oversized message");
            *self = Self::new();
            return Err(err);
        }

        let mut scratch = [0u8; RECEIVE_CHUNK_SIZE];
        while self.payload.len() < declared {
            let wanted = (declared - self.payload.len()).min(RECEIVE_CHUNK_SIZE);
            let transfer = receive_chunk(&mut scratch[..wanted]);
            if transfer.status != Status::Done {
                return Ok(Reassembly::Pending(transfer.status));
            }
            self.payload
                .extend_from_slice(&scratch[..transfer.bytes.min(wanted)]);
        }

        trace!(len = declared, "message reassembled");
        let payload = std::mem::take(self).payload.freeze();
        Ok(Reassembly::Complete(payload))
    }
}
