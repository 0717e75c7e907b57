use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tcpmsg_frame::FrameConfig;
use tcpmsg_socket::{Packet, Status};
use tracing::{debug, info, warn};

use crate::cmd::{
    accept_until_stopped, bind_polling, install_ctrlc_handler, receive_until_stopped, ListenArgs,
};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let acceptor = bind_polling(args.bind)?;
    let config = FrameConfig {
        max_payload_size: args.max_payload,
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while let Some((mut conn, peer)) = accept_until_stopped(&acceptor, &config, &running)? {
        info!(%peer, "peer connected");
        let mut message = Packet::new();

        while let Some(status) = receive_until_stopped(&mut conn, &mut message, &running) {
            match status {
                Status::Done => {}
                Status::Disconnected => {
                    debug!(%peer, "peer disconnected");
                    break;
                }
                status => {
                    warn!(%peer, %status, error = ?conn.last_error(), "dropping peer");
                    break;
                }
            }

            print_message(message.as_bytes(), peer, format);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
    }

    info!("shutting down");
    Ok(SUCCESS)
}
