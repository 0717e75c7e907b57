//! Length-prefixed message framing for stream transports.
//!
//! Every message travels as a 4-byte big-endian payload length followed by
//! exactly that many payload bytes. There is no magic, checksum or type tag.
//!
//! Receiving is resumable: [`PendingMessage`] keeps the partially received
//! prefix and payload between calls, so a non-blocking caller can stop on
//! `NotReady` and pick up later without losing or duplicating bytes.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{decode_prefix, encode_prefix, FrameConfig, DEFAULT_MAX_PAYLOAD, PREFIX_SIZE};
pub use error::{FrameError, Result};
pub use message::{Message, Packet};
pub use reader::{PendingMessage, Reassembly, ReceiveState, RECEIVE_CHUNK_SIZE};
pub use writer::SendStaging;
