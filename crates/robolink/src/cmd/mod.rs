use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use robolink_frame::FrameConfig;
use robolink_link::{handle_failure, Connection, FailureKind, LinkConfig, Outcome};
use robolink_payload::Payload;

use crate::exit::{fatal, CliError, CliResult, INTERNAL, USAGE};
use crate::output::{OutputFormat, Summary};

pub mod camera;
pub mod control;
pub mod telemetry;
pub mod version;
pub mod view;

pub const CAMERA_PORT: &str = "4422";
pub const TELEMETRY_PORT: &str = "4421";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve camera frames from JPEG files to one viewer at a time.
    Camera(CameraArgs),
    /// Connect to a camera server and receive frames.
    View(ViewArgs),
    /// Serve telemetry and print the motor commands that come back.
    Telemetry(TelemetryArgs),
    /// Connect to a telemetry server and answer each sample with a motor command.
    Control(ControlArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Camera(args) => camera::run(args, format),
        Command::View(args) => view::run(args, format),
        Command::Telemetry(args) => telemetry::run(args, format),
        Command::Control(args) => control::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection tuning shared by every link command.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Bound on the initial connect and on each reconnect window (e.g. 10s, 500ms).
    #[arg(long, env = "ROBOLINK_CONNECT_TIMEOUT", default_value = "10s")]
    pub connect_timeout: String,
    /// Pause between refused reconnect attempts.
    #[arg(long, env = "ROBOLINK_RECONNECT_INTERVAL", default_value = "250ms")]
    pub reconnect_interval: String,
    /// Give up on a silent peer after this long. Default: wait forever.
    #[arg(long, env = "ROBOLINK_READ_TIMEOUT")]
    pub read_timeout: Option<String>,
    /// Give up on a stalled write after this long. Default: wait forever.
    #[arg(long, env = "ROBOLINK_WRITE_TIMEOUT")]
    pub write_timeout: Option<String>,
    /// Largest frame body accepted from the peer, in bytes.
    #[arg(
        long,
        env = "ROBOLINK_MAX_PAYLOAD",
        default_value_t = robolink_frame::DEFAULT_MAX_PAYLOAD
    )]
    pub max_payload: usize,
}

impl LinkArgs {
    pub fn to_config(&self) -> CliResult<LinkConfig> {
        if self.max_payload == 0 {
            return Err(CliError::new(USAGE, "--max-payload must be greater than zero"));
        }
        Ok(LinkConfig {
            connect_timeout: parse_duration(&self.connect_timeout)?,
            reconnect_interval: parse_duration(&self.reconnect_interval)?,
            frame: FrameConfig {
                max_payload_size: self.max_payload,
                read_timeout: self.read_timeout.as_deref().map(parse_duration).transpose()?,
                write_timeout: self.write_timeout.as_deref().map(parse_duration).transpose()?,
                ..FrameConfig::default()
            },
            ..LinkConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct CameraArgs {
    /// Address to listen on.
    #[arg(env = "ROBOLINK_ADDR", default_value = "0.0.0.0")]
    pub address: String,
    #[arg(long, short = 'p', env = "ROBOLINK_PORT", default_value = CAMERA_PORT)]
    pub port: u16,
    /// JPEG file, or directory of JPEG files streamed in name order and cycled.
    #[arg(long, value_name = "PATH")]
    pub source: PathBuf,
    /// Delay between frames.
    #[arg(long, default_value = "33ms")]
    pub interval: String,
    /// Exit after sending N frames.
    #[arg(long)]
    pub count: Option<u64>,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Camera server address.
    #[arg(env = "ROBOLINK_ADDR")]
    pub address: String,
    #[arg(long, short = 'p', env = "ROBOLINK_PORT", default_value = CAMERA_PORT)]
    pub port: u16,
    /// Write the most recent frame to this file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<u64>,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct TelemetryArgs {
    /// Address to listen on.
    #[arg(env = "ROBOLINK_ADDR", default_value = "0.0.0.0")]
    pub address: String,
    #[arg(long, short = 'p', env = "ROBOLINK_PORT", default_value = TELEMETRY_PORT)]
    pub port: u16,
    /// JSON telemetry record, re-read every cycle. Default: an all-zero record.
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,
    /// Exit after N completed cycles.
    #[arg(long)]
    pub count: Option<u64>,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct ControlArgs {
    /// Telemetry server address.
    #[arg(env = "ROBOLINK_ADDR")]
    pub address: String,
    #[arg(long, short = 'p', env = "ROBOLINK_PORT", default_value = TELEMETRY_PORT)]
    pub port: u16,
    /// Motor A command.
    #[arg(long, allow_negative_numbers = true, default_value_t = 0)]
    pub ma: i32,
    /// Motor B command.
    #[arg(long, allow_negative_numbers = true, default_value_t = 0)]
    pub mb: i32,
    /// Exit after N completed cycles.
    #[arg(long)]
    pub count: Option<u64>,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Set on the first Ctrl-C; loops check it between cycles. A second Ctrl-C
/// exits immediately, since accept and read block.
pub fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        if !flag.swap(false, Ordering::SeqCst) {
            std::process::exit(130);
        }
        tracing::info!("interrupt received; stopping after the current cycle");
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}

/// Apply the shared failure policy on behalf of a command loop.
///
/// Returns normally when the loop may go on; a fatal outcome becomes the
/// command's error.
pub fn recover<C: Connection>(
    conn: &mut C,
    kind: FailureKind,
    in_flight: Option<&Payload>,
    summary: &mut Summary,
) -> CliResult<()> {
    match handle_failure(conn, kind, in_flight) {
        Outcome::Ok(()) => {
            summary.dropped += 1;
            Ok(())
        }
        Outcome::RecoveredRetry => {
            summary.recoveries += 1;
            Ok(())
        }
        Outcome::Fatal(kind) => Err(fatal(&format!("{} link lost", conn.role()), kind)),
    }
}

pub fn reached(count: Option<u64>, done: u64) -> bool {
    count.is_some_and(|limit| done >= limit)
}
