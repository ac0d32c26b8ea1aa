mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "robolink", version, about = "Telepresence robot link")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true, env = "ROBOLINK_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "ROBOLINK_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
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
    fn parses_control_subcommand() {
        let cli = Cli::try_parse_from([
            "robolink", "control", "10.0.0.5", "--ma", "-60", "--mb", "60", "--count", "3",
        ])
        .expect("control args should parse");

        let Command::Control(args) = cli.command else {
            panic!("expected control");
        };
        assert_eq!(args.address, "10.0.0.5");
        assert_eq!(args.port, 4421);
        assert_eq!((args.ma, args.mb), (-60, 60));
        assert_eq!(args.count, Some(3));
        assert_eq!(args.link.connect_timeout, "10s");
    }

    #[test]
    fn server_commands_default_to_any_address() {
        let cli = Cli::try_parse_from(["robolink", "camera", "--source", "/tmp/frames"])
            .expect("camera args should parse");
        let Command::Camera(args) = cli.command else {
            panic!("expected camera");
        };
        assert_eq!(args.address, "0.0.0.0");
        assert_eq!(args.port, 4422);
        assert_eq!(args.interval, "33ms");
    }

    #[test]
    fn view_requires_an_address() {
        let err = Cli::try_parse_from(["robolink", "view"]).expect_err("address is required");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn camera_requires_a_source() {
        let err = Cli::try_parse_from(["robolink", "camera", "127.0.0.1"])
            .expect_err("source is required");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "robolink",
            "telemetry",
            "--port",
            "5000",
            "--format",
            "pretty",
            "--log-level",
            "debug",
            "--read-timeout",
            "2s",
        ])
        .expect("telemetry args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Pretty));
        assert_eq!(cli.log_level, LogLevel::Debug);
        let Command::Telemetry(args) = cli.command else {
            panic!("expected telemetry");
        };
        assert_eq!(args.port, 5000);
        assert_eq!(args.link.read_timeout.as_deref(), Some("2s"));
    }
}
