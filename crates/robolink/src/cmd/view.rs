use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;

use robolink_link::{ClientConnection, Connection, FailureKind, Received};
use robolink_payload::{ImageFrame, Payload};
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, reached, recover, ViewArgs};
use crate::exit::{io_error, link_error, CliResult, SUCCESS};
use crate::output::{print_image, print_summary, OutputFormat, Summary};

pub fn run(args: ViewArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.to_config()?;
    let mut conn = ClientConnection::connect_with_config(&args.address, args.port, config)
        .map_err(|err| link_error("connect failed", err))?;
    info!(remote = %conn.remote_addr(), "viewing camera stream");

    let running = install_ctrlc_handler()?;
    let mut summary = Summary {
        role: "view",
        ..Summary::default()
    };

    while running.load(Ordering::SeqCst) && !reached(args.count, summary.received) {
        match conn.receive() {
            Ok(Received::Payload(Payload::Image(frame))) => {
                summary.received += 1;
                if let Some(path) = &args.output {
                    save_frame(path, &frame)?;
                }
                print_image(&frame, summary.received, conn.peer_addr(), format);
            }
            Ok(Received::Payload(other)) => {
                warn!(kind = other.kind(), "ignoring non-image payload on camera link");
                summary.dropped += 1;
            }
            Ok(Received::Reconnected) => {
                recover(&mut conn, FailureKind::Reconnected, None, &mut summary)?;
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "frame not received");
                recover(&mut conn, err.kind(), None, &mut summary)?;
            }
        }
    }

    conn.close();
    print_summary(&summary, format);
    Ok(SUCCESS)
}

/// Replace `path` with the frame, going through a sibling temp file so a
/// reader never sees a half-written image.
fn save_frame(path: &Path, frame: &ImageFrame) -> CliResult<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".partial");
    fs::write(&staging, &frame.bytes)
        .and_then(|()| fs::rename(&staging, path))
        .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))
}
