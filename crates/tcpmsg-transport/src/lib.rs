//! TCP transport handle and status vocabulary.
//!
//! This is the lowest layer of tcpmsg. It owns the raw socket handle and
//! normalizes every transport outcome into a small [`Status`] set:
//! - [`Transport`] is the handle contract the upper layers drive
//! - [`TcpTransport`] implements it over a real TCP socket (Unix)
//! - [`TcpAcceptor`] accepts incoming connections for server-side use

pub mod error;
pub mod status;
pub mod traits;

#[cfg(unix)]
pub mod listener;
#[cfg(unix)]
pub mod tcp;

pub use error::{Result, TransportError};
pub use status::{Status, Transfer};
pub use traits::{Readiness, Transport};

#[cfg(unix)]
pub use listener::TcpAcceptor;
#[cfg(unix)]
pub use tcp::TcpTransport;
