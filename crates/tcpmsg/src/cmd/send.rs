use std::fs;
use std::time::{Duration, Instant};

use tcpmsg_socket::{Message, Packet, Status, StreamConnection, Transport};
use tracing::debug;

use crate::cmd::{connect, parse_duration, SendArgs};
use crate::exit::{io_error, status_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_message, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = resolve_payload(&args)?;

    let mut conn = connect(args.addr, timeout, args.max_payload)?;
    let mut message = Packet::from(payload);
    match conn.send_message(&mut message) {
        Status::Done => debug!(size = message.len(), "message sent"),
        status => return Err(status_error("send failed", status, conn.last_error())),
    }

    if args.wait {
        conn.set_blocking(false)
            .map_err(|err| io_error("failed to switch to non-blocking mode", &err))?;
        let mut reply = Packet::new();
        receive_before(&mut conn, &mut reply, Instant::now() + wait_timeout)?;
        print_message(reply.as_bytes(), args.addr, format);
    }

    conn.disconnect();
    Ok(SUCCESS)
}

/// Poll a non-blocking connection until one whole message is in or
/// `deadline` passes. Partial progress carries over between polls.
fn receive_before<T, M>(
    conn: &mut StreamConnection<T>,
    message: &mut M,
    deadline: Instant,
) -> CliResult<()>
where
    T: Transport,
    M: Message + ?Sized,
{
    loop {
        match conn.receive_message(message) {
            Status::Done => return Ok(()),
            Status::NotReady => {
                if Instant::now() >= deadline {
                    return Err(CliError::new(
                        TIMEOUT,
                        format!(
                            "no reply before deadline ({:?} received)",
                            conn.pending_message().state()
                        ),
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            status => return Err(status_error("receive failed", status, conn.last_error())),
        }
    }
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), &err));
    }
    Ok(Vec::new())
}
