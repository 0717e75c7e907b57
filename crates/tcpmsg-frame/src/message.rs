use bytes::{Bytes, BytesMut};

/// Application-level message carried by the framing layer.
///
/// The connection borrows the payload only for the duration of a send or
/// receive call; it never keeps a reference to it afterwards.
pub trait Message {
    /// The payload bytes to transmit.
    fn on_send(&self) -> &[u8];

    /// Ingest a fully received payload. Never called with an empty slice.
    fn on_receive(&mut self, payload: &[u8]);

    /// Drop the current contents before a receive attempt.
    fn clear(&mut self);

    /// Bytes of the staged block (prefix included) already sent by an
    /// earlier `Partial` send.
    fn resume_offset(&self) -> usize;

    fn set_resume_offset(&mut self, offset: usize);
}

/// A plain byte-buffer message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    data: BytesMut,
    send_pos: usize,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the payload.
    pub fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the packet and return its payload.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }
}

impl Message for Packet {
    fn on_send(&self) -> &[u8] {
        &self.data[..]
    }

    fn on_receive(&mut self, payload: &[u8]) {
        self.append(payload);
    }

    fn clear(&mut self) {
        self.data.clear();
        self.send_pos = 0;
    }

    fn resume_offset(&self) -> usize {
        self.send_pos
    }

    fn set_resume_offset(&mut self, offset: usize) {
        self.send_pos = offset;
    }
}

impl From<&[u8]> for Packet {
    fn from(data: &[u8]) -> Self {
        Self {
            data: BytesMut::from(data),
            send_pos: 0,
        }
    }
}

impl From<Vec<u8>> for Packet {
    fn from(data: Vec<u8>) -> Self {
        Self::from(data.as_slice())
    }
}

impl From<&str> for Packet {
    fn from(data: &str) -> Self {
        Self::from(data.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read_back() {
        let mut packet = Packet::new();
        assert!(packet.is_empty());

        packet.append(b"abc");
        packet.append(b"def");
        assert_eq!(packet.len(), 6);
        assert_eq!(packet.as_bytes(), b"abcdef");
        assert_eq!(packet.on_send(), b"abcdef");
    }

    #[test]
    fn on_receive_appends_payload() {
        let mut packet = Packet::from("head-");
        packet.on_receive(b"tail");
        assert_eq!(packet.as_bytes(), b"head-tail");
    }

    #[test]
    fn clear_resets_payload_and_offset() {
        let mut packet = Packet::from(vec![1u8, 2, 3]);
        packet.set_resume_offset(2);

        packet.clear();
        assert!(packet.is_empty());
        assert_eq!(packet.resume_offset(), 0);
    }

    #[test]
    fn into_bytes_returns_payload() {
        let packet = Packet::from(&b"payload"[..]);
        assert_eq!(packet.into_bytes().as_ref(), b"payload");
    }
}
