//! Minimal echo server: accepts one peer and echoes its messages back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:7400 --json '{"hello":"world"}' --wait

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use tcpmsg::transport::TcpAcceptor;
    use tcpmsg::{Packet, Status, StreamConnection};

    let acceptor = TcpAcceptor::bind("127.0.0.1:7400".parse()?)?;
    eprintln!("Listening on {}", acceptor.local_addr());

    let (transport, peer) = acceptor.accept()?;
    eprintln!("Peer connected: {peer}");
    let mut conn = StreamConnection::with_transport(transport);

    let mut message = Packet::new();
    loop {
        match conn.receive_message(&mut message) {
            Status::Done => {
                eprintln!("Received {} bytes", message.len());
                let status = conn.send_message(&mut message);
                if status != Status::Done {
                    eprintln!("Echo failed: {status}");
                    break;
                }
            }
            status => {
                eprintln!("Peer gone: {status}");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("echo-server requires a unix platform");
}
