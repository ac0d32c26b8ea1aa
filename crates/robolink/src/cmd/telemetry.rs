use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;

use robolink_link::{Connection, FailureKind, Received, ServerConnection};
use robolink_payload::{Payload, TelemetryRecord};
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, reached, recover, TelemetryArgs};
use crate::exit::{io_error, link_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_command, print_summary, OutputFormat, Summary};

pub fn run(args: TelemetryArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.to_config()?;
    let mut source = RecordSource::new(args.record.as_deref())?;

    let mut conn = ServerConnection::bind_with_config(&args.address, args.port, config)
        .map_err(|err| link_error("bind failed", err))?;
    info!(addr = %conn.local_addr(), "telemetry server listening");

    let running = install_ctrlc_handler()?;
    conn.wait_for_connection()
        .map_err(|err| link_error("accept failed", err))?;

    let mut summary = Summary {
        role: "telemetry",
        ..Summary::default()
    };
    let mut cycles = 0u64;

    while running.load(Ordering::SeqCst) && !reached(args.count, cycles) {
        let payload = Payload::Telemetry(source.next());
        if let Err(err) = conn.send(&payload) {
            warn!(error = %err, kind = %err.kind(), "telemetry not delivered");
            recover(&mut conn, err.kind(), Some(&payload), &mut summary)?;
            continue;
        }
        summary.sent += 1;

        match conn.receive() {
            Ok(Received::Payload(Payload::Command(command))) => {
                summary.received += 1;
                cycles += 1;
                print_command(&command, conn.peer_addr(), format);
            }
            Ok(Received::Payload(other)) => {
                warn!(kind = other.kind(), "expected a motor command");
                summary.dropped += 1;
            }
            Ok(Received::Reconnected) => {
                recover(&mut conn, FailureKind::Reconnected, None, &mut summary)?;
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "motor command not received");
                recover(&mut conn, err.kind(), None, &mut summary)?;
            }
        }
    }

    conn.close();
    print_summary(&summary, format);
    Ok(SUCCESS)
}

/// Telemetry to publish each cycle: the record file as last read
/// successfully, or all zeros when no file was given.
struct RecordSource<'a> {
    path: Option<&'a Path>,
    last: TelemetryRecord,
}

impl<'a> RecordSource<'a> {
    /// The file must be readable at startup; later read errors reuse the
    /// previous record.
    fn new(path: Option<&'a Path>) -> CliResult<Self> {
        let last = match path {
            Some(path) => read_record(path)?,
            None => TelemetryRecord::default(),
        };
        Ok(Self { path, last })
    }

    fn next(&mut self) -> TelemetryRecord {
        if let Some(path) = self.path {
            match read_record(path) {
                Ok(record) => self.last = record,
                Err(err) => warn!(error = %err, "keeping previous telemetry record"),
            }
        }
        self.last.clone()
    }
}

fn read_record(path: &Path) -> CliResult<TelemetryRecord> {
    let text = fs::read(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_slice(&text).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("{} is not a telemetry record: {err}", path.display()),
        )
    })
}
