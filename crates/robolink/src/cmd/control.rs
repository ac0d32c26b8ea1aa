use std::sync::atomic::Ordering;

use robolink_link::{ClientConnection, Connection, FailureKind, Received};
use robolink_payload::{CommandRecord, Payload};
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, reached, recover, ControlArgs};
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_summary, print_telemetry, OutputFormat, Summary};

pub fn run(args: ControlArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.to_config()?;
    let command = Payload::Command(CommandRecord::new(args.ma, args.mb));

    let mut conn = ClientConnection::connect_with_config(&args.address, args.port, config)
        .map_err(|err| link_error("connect failed", err))?;
    info!(remote = %conn.remote_addr(), ma = args.ma, mb = args.mb, "driving robot");

    let running = install_ctrlc_handler()?;
    let mut summary = Summary {
        role: "control",
        ..Summary::default()
    };
    let mut cycles = 0u64;

    while running.load(Ordering::SeqCst) && !reached(args.count, cycles) {
        // Answer only after telemetry has arrived.
        match conn.receive() {
            Ok(Received::Payload(Payload::Telemetry(record))) => {
                summary.received += 1;
                print_telemetry(&record, conn.peer_addr(), format);
            }
            Ok(Received::Payload(other)) => {
                warn!(kind = other.kind(), "expected telemetry");
                summary.dropped += 1;
                continue;
            }
            Ok(Received::Reconnected) => {
                recover(&mut conn, FailureKind::Reconnected, None, &mut summary)?;
                continue;
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "telemetry not received");
                recover(&mut conn, err.kind(), None, &mut summary)?;
                continue;
            }
        }

        match conn.send(&command) {
            Ok(()) => {
                summary.sent += 1;
                cycles += 1;
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "motor command not delivered");
                recover(&mut conn, err.kind(), Some(&command), &mut summary)?;
            }
        }
    }

    conn.close();
    print_summary(&summary, format);
    Ok(SUCCESS)
}
