use bytes::{BufMut, BytesMut};

use crate::codec::{encode_prefix, PREFIX_SIZE};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Reusable buffer holding one outgoing message as a single contiguous
/// block: length prefix followed by payload.
///
/// Sending the block with one write keeps the prefix from ever being
/// transmitted separately from the payload. Resume offsets are expressed
/// against the whole block, prefix included.
#[derive(Debug)]
pub struct SendStaging {
    buf: BytesMut,
}

impl SendStaging {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Rebuild the staged block for `payload` and return it.
    pub fn stage(&mut self, payload: &[u8]) -> Result<&[u8]> {
        let prefix = encode_prefix(payload.len())?;

        self.buf.clear();
        self.buf.reserve(PREFIX_SIZE + payload.len());
        self.buf.put_slice(&prefix);
        self.buf.put_slice(payload);

        Ok(&self.buf[..])
    }

    /// Drop the staged bytes, keeping the allocation for the next message.
    pub fn release(&mut self) {
        self.buf.clear();
    }

    /// The currently staged block (empty after `release`).
    pub fn staged(&self) -> &[u8] {
        &self.buf[..]
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

impl Default for SendStaging {
    fn default() -> Self {
        Self::new()
    }
}
