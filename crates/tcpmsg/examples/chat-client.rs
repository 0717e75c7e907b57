//! Non-blocking client: connects with a deadline, then interleaves sending
//! and receiving, resuming partial transfers on the next loop iteration.
//!
//! Start the echo server first:
//!   cargo run --example echo-server
//!
//! Then:
//!   cargo run --example chat-client

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use tcpmsg::{Packet, Status, StreamConnection};

    let mut conn = StreamConnection::new();
    let status = conn.connect(IpAddr::V4(Ipv4Addr::LOCALHOST), 7400, Duration::from_secs(3));
    if status != Status::Done {
        return Err(format!("connect failed: {status}").into());
    }
    eprintln!(
        "Connected from port {} to {:?}:{}",
        conn.local_port(),
        conn.remote_address(),
        conn.remote_port()
    );
    conn.set_blocking(false)?;

    let lines = ["hello", "resumable", "world"];
    let mut outgoing = lines.iter().map(|line| Packet::from(*line)).peekable();
    let mut replies = 0;
    let mut incoming = Packet::new();

    while replies < lines.len() {
        if let Some(message) = outgoing.peek_mut() {
            match conn.send_message(message) {
                Status::Done => {
                    outgoing.next();
                }
                Status::Partial | Status::NotReady => {}
                status => return Err(format!("send failed: {status}").into()),
            }
        }

        match conn.receive_message(&mut incoming) {
            Status::Done => {
                replies += 1;
                println!("{}", String::from_utf8_lossy(incoming.as_bytes()));
            }
            Status::NotReady => std::thread::sleep(Duration::from_millis(5)),
            status => return Err(format!("receive failed: {status}").into()),
        }
    }

    conn.disconnect();
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("chat-client requires a unix platform");
}
