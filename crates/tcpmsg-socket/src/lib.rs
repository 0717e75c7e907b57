//! Connection-oriented stream socket with message boundaries.
//!
//! [`StreamConnection`] owns one transport handle and layers three things
//! on top of it:
//! - connect with an optional deadline, disconnect, endpoint queries
//! - raw send/receive normalized into the [`Status`] vocabulary
//! - length-prefixed messages whose receipt can be resumed across calls
//!
//! A connection is not internally synchronized; drive each instance from
//! one thread at a time.

pub mod connection;

pub use connection::StreamConnection;
pub use tcpmsg_frame::{FrameConfig, Message, Packet, PendingMessage, ReceiveState};
pub use tcpmsg_transport::{Readiness, Status, Transfer, Transport};

#[cfg(unix)]
pub use tcpmsg_transport::TcpTransport;
