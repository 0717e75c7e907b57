//! Length-prefixed messages over TCP with resumable non-blocking I/O.
//!
//! tcpmsg wraps a TCP stream in a connection that speaks in whole messages:
//! every message travels as a 4-byte big-endian length followed by its
//! payload, and a receive interrupted by a would-block picks up where it
//! stopped on the next call.
//!
//! # Crate Structure
//!
//! - [`transport`]: status vocabulary, transport handle trait, TCP handle and acceptor
//! - [`frame`]: length prefix codec, send staging, incoming message reassembly
//! - [`socket`]: `StreamConnection`, tying a handle to message framing

/// Re-export transport types.
pub mod transport {
    pub use tcpmsg_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tcpmsg_frame::*;
}

/// Re-export connection types.
pub mod socket {
    pub use tcpmsg_socket::*;
}

pub use tcpmsg_socket::{Message, Packet, Status, StreamConnection};
