#[cfg(not(unix))]
compile_error!("the tcpmsg CLI supports unix platforms only");

mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tcpmsg", version, about = "Length-prefixed TCP messaging CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "TCPMSG_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);

    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "tcpmsg",
            "send",
            "127.0.0.1:7400",
            "--data",
            "hello",
            "--wait",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.addr.port(), 7400);
                assert!(args.wait);
                assert_eq!(args.max_payload, tcpmsg_frame::DEFAULT_MAX_PAYLOAD);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "tcpmsg",
            "send",
            "127.0.0.1:7400",
            "--json",
            "{\"x\":1}",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_address_without_port() {
        let err = Cli::try_parse_from(["tcpmsg", "info", "127.0.0.1"])
            .expect_err("address without port should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_zero_listen_count() {
        let err = Cli::try_parse_from(["tcpmsg", "listen", "127.0.0.1:9000", "--count", "0"])
            .expect_err("zero count should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_listen_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tcpmsg",
            "listen",
            "0.0.0.0:9000",
            "--count",
            "3",
            "--max-payload",
            "4096",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("listen args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.count, Some(3));
                assert_eq!(args.max_payload, 4096);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
