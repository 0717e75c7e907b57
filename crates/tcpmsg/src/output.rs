use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput {
    kind: &'static str,
    peer: String,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message(payload: &[u8], peer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind: "message",
                peer: peer.to_string(),
                payload_size: payload.len(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    peer.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "peer={} size={} payload={}",
                peer,
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

const HEX_PREVIEW_BYTES: usize = 16;

/// UTF-8 payloads verbatim; anything else as its size and a short hex prefix.
pub fn payload_preview(payload: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(payload) {
        return text.to_string();
    }

    let hex: String = payload
        .iter()
        .take(HEX_PREVIEW_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect();
    let more = if payload.len() > HEX_PREVIEW_BYTES { ".." } else { "" };
    format!("<binary {} bytes: {hex}{more}>", payload.len())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_shows_text_and_summarizes_binary() {
        assert_eq!(payload_preview(b"hello"), "hello");
        assert_eq!(payload_preview(&[0xff, 0xfe, 0x00]), "<binary 3 bytes: fffe00>");
        assert_eq!(
            payload_preview(&[0xff; 20]),
            format!("<binary 20 bytes: {}..>", "ff".repeat(16))
        );
        assert_eq!(payload_preview(b""), "");
    }
}
