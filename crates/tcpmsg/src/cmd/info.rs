use std::net::IpAddr;
use std::time::Instant;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use tcpmsg_frame::DEFAULT_MAX_PAYLOAD;

use crate::cmd::{connect, parse_duration, InfoArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct InfoOutput {
    kind: &'static str,
    local_port: u16,
    remote_address: Option<IpAddr>,
    remote_port: u16,
    connect_latency_ms: f64,
    connected: bool,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;

    let start = Instant::now();
    let mut conn = connect(args.addr, timeout, DEFAULT_MAX_PAYLOAD)?;
    let latency = start.elapsed();

    let out = InfoOutput {
        kind: "connection-info",
        local_port: conn.local_port(),
        remote_address: conn.remote_address(),
        remote_port: conn.remote_port(),
        connect_latency_ms: (latency.as_secs_f64() * 1000.0 * 100.0).round() / 100.0,
        connected: conn.remote_address().is_some(),
    };
    conn.disconnect();

    print_info(&out, format);
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    let remote = out
        .remote_address
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unavailable".to_string());

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["Local port".to_string(), out.local_port.to_string()])
                .add_row(vec!["Remote address".to_string(), remote])
                .add_row(vec!["Remote port".to_string(), out.remote_port.to_string()])
                .add_row(vec![
                    "Connect latency".to_string(),
                    format!("{:.2}ms", out.connect_latency_ms),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Connection Info:");
            println!("  Local port:       {}", out.local_port);
            println!("  Remote address:   {remote}");
            println!("  Remote port:      {}", out.remote_port);
            println!("  Connect latency:  {:.2}ms", out.connect_latency_ms);
        }
        OutputFormat::Raw => {
            println!("{}:{}", remote, out.remote_port);
        }
    }
}
