use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tcpmsg_frame::FrameConfig;
use tcpmsg_socket::{Packet, Status, StreamConnection, Transport};
use tracing::{debug, info, warn};

use crate::cmd::{
    accept_until_stopped, bind_polling, install_ctrlc_handler, receive_until_stopped,
    send_until_stopped, EchoArgs,
};
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Why an echo session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The peer closed the connection.
    PeerClosed,
    /// A receive or send failed with the given status.
    Failed(Status),
    /// Shutdown was requested.
    Stopped,
}

pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    let acceptor = bind_polling(args.bind)?;
    let config = FrameConfig {
        max_payload_size: args.max_payload,
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    while let Some((mut conn, peer)) = accept_until_stopped(&acceptor, &config, &running)? {
        info!(%peer, "peer connected");

        match echo_session(&mut conn, &running) {
            SessionEnd::PeerClosed => debug!(%peer, "peer disconnected"),
            SessionEnd::Stopped => break,
            SessionEnd::Failed(status) => {
                warn!(%peer, %status, error = ?conn.last_error(), "dropping peer");
            }
        }
    }

    info!("shutting down");
    Ok(SUCCESS)
}

fn echo_session<T: Transport>(conn: &mut StreamConnection<T>, running: &AtomicBool) -> SessionEnd {
    let mut message = Packet::new();

    loop {
        match receive_until_stopped(conn, &mut message, running) {
            None => return SessionEnd::Stopped,
            Some(Status::Done) => {}
            Some(Status::Disconnected) => return SessionEnd::PeerClosed,
            Some(status) => return SessionEnd::Failed(status),
        }

        info!(size = message.len(), "echoing message");

        match send_until_stopped(conn, &mut message, running) {
            None => return SessionEnd::Stopped,
            Some(Status::Done) => {}
            Some(Status::Disconnected) => return SessionEnd::PeerClosed,
            Some(status) => return SessionEnd::Failed(status),
        }
    }
}
