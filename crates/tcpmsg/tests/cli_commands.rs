#![cfg(all(unix, feature = "cli"))]

use std::io::{BufRead, BufReader};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tcpmsg::{Packet, Status, StreamConnection};

fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral bind should work");
    listener.local_addr().expect("bound listener has an address")
}

fn wait_for_listener(addr: SocketAddr, timeout: Duration) {
    let start = Instant::now();
    loop {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        if start.elapsed() >= timeout {
            panic!("server at {addr} never came up");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn spawn_server(subcommand: &str, addr: SocketAddr, extra: &[&str]) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg(subcommand)
        .arg(addr.to_string())
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("server command should start");
    wait_for_listener(addr, Duration::from_secs(3));
    child
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn send_wait_roundtrips_through_echo_server() {
    let addr = free_addr();
    let server = spawn_server("echo", addr, &[]);

    let output = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg(addr.to_string())
        .arg("--json")
        .arg(r#"{"hello":"world"}"#)
        .arg("--wait")
        .output()
        .expect("send should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let reply: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("reply should be json");
    assert_eq!(reply["kind"], "message");
    assert_eq!(reply["payload"], r#"{"hello":"world"}"#);
    assert_eq!(reply["payload_size"], 17);
    assert_eq!(reply["peer"], addr.to_string());

    stop(server);
}

#[test]
fn send_raw_output_is_payload_only() {
    let addr = free_addr();
    let server = spawn_server("echo", addr, &[]);

    let output = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("raw")
        .arg("send")
        .arg(addr.to_string())
        .arg("--data")
        .arg("plain bytes")
        .arg("--wait")
        .output()
        .expect("send should run");

    assert!(output.status.success());
    assert_eq!(output.stdout, b"plain bytes");

    stop(server);
}

#[test]
fn listen_prints_each_message_then_exits_at_count() {
    let addr = free_addr();
    let mut server = spawn_server("listen", addr, &["--count", "2"]);

    let mut conn = StreamConnection::new();
    assert_eq!(
        conn.connect(addr.ip(), addr.port(), Duration::from_secs(3)),
        Status::Done
    );
    for text in ["first", ""] {
        let mut message = Packet::from(text);
        assert_eq!(conn.send_message(&mut message), Status::Done);
    }

    let stdout = server.stdout.take().expect("stdout is piped");
    let lines: Vec<serde_json::Value> = BufReader::new(stdout)
        .lines()
        .map(|line| serde_json::from_str(&line.expect("line should read")).expect("json line"))
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["payload"], "first");
    assert_eq!(lines[1]["payload_size"], 0);

    let status = server.wait().expect("listen should exit");
    assert!(status.success());
}

#[test]
fn interrupt_stops_listen_with_idle_peer() {
    let addr = free_addr();
    let mut server = spawn_server("listen", addr, &[]);

    // Keep a peer connected but silent so the server sits in a receive.
    let _idle = TcpStream::connect(addr).expect("peer should connect");
    thread::sleep(Duration::from_millis(200));

    let sent = Command::new("kill")
        .arg("-INT")
        .arg(server.id().to_string())
        .status()
        .expect("kill should run");
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = server.try_wait().expect("wait should work") {
            break status;
        }
        if Instant::now() >= deadline {
            stop(server);
            panic!("listen ignored the interrupt");
        }
        thread::sleep(Duration::from_millis(25));
    };
    assert!(status.success());
}

#[test]
fn info_reports_both_endpoints() {
    let addr = free_addr();
    let server = spawn_server("echo", addr, &[]);

    let output = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg(addr.to_string())
        .arg("--timeout")
        .arg("2s")
        .output()
        .expect("info should run");

    assert!(output.status.success());
    let info: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("info should be json");
    assert_eq!(info["kind"], "connection-info");
    assert_eq!(info["connected"], true);
    assert_eq!(info["remote_address"], IpAddr::V4(Ipv4Addr::LOCALHOST).to_string());
    assert_eq!(info["remote_port"], addr.port());
    assert_ne!(info["local_port"], 0);

    stop(server);
}

#[test]
fn connect_refused_exits_with_failure() {
    let addr = free_addr();

    let output = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("--log-level")
        .arg("off")
        .arg("info")
        .arg(addr.to_string())
        .arg("--timeout")
        .arg("2s")
        .output()
        .expect("info should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect to"));
}

#[test]
fn invalid_json_payload_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("send")
        .arg("127.0.0.1:9")
        .arg("--json")
        .arg("{not json")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_tcpmsg"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("tcpmsg {}", env!("CARGO_PKG_VERSION")));
}
