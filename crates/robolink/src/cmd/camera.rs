use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use robolink_link::{Connection, ServerConnection};
use robolink_payload::{ImageFrame, Payload};
use tracing::{debug, info, warn};

use crate::cmd::{install_ctrlc_handler, parse_duration, reached, recover, CameraArgs};
use crate::exit::{io_error, link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{looks_like_jpeg, print_summary, OutputFormat, Summary};

pub fn run(args: CameraArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.to_config()?;
    let frames = load_frames(&args.source, config.frame.max_payload_size)?;
    let interval = parse_duration(&args.interval)?;

    let mut conn = ServerConnection::bind_with_config(&args.address, args.port, config)
        .map_err(|err| link_error("bind failed", err))?;
    info!(addr = %conn.local_addr(), frames = frames.len(), "camera server listening");

    let running = install_ctrlc_handler()?;
    conn.wait_for_connection()
        .map_err(|err| link_error("accept failed", err))?;

    let mut summary = Summary {
        role: "camera",
        ..Summary::default()
    };

    for frame in frames.iter().cycle() {
        if !running.load(Ordering::SeqCst) || reached(args.count, summary.sent) {
            break;
        }

        let payload = Payload::Image(frame.clone());
        match conn.send(&payload) {
            Ok(()) => {
                summary.sent += 1;
                debug!(sequence = summary.sent, size = frame.bytes.len(), "frame sent");
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "frame not delivered");
                recover(&mut conn, err.kind(), Some(&payload), &mut summary)?;
            }
        }

        std::thread::sleep(interval);
    }

    print_summary(&summary, format);
    Ok(SUCCESS)
}

/// Read every JPEG under `source` into memory, in file-name order.
///
/// Files whose tagged body would exceed `max_payload` are skipped.
fn load_frames(source: &Path, max_payload: usize) -> CliResult<Vec<ImageFrame>> {
    let paths = if source.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(source)
            .map_err(|err| io_error(&format!("failed reading {}", source.display()), err))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| has_jpeg_extension(path))
            .collect();
        paths.sort();
        paths
    } else {
        vec![source.to_path_buf()]
    };

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(&path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        // One extra byte for the body tag.
        if bytes.len() >= max_payload {
            warn!(
                path = %path.display(),
                size = bytes.len(),
                max_payload,
                "source file exceeds the payload limit; skipping"
            );
            continue;
        }
        if !looks_like_jpeg(&bytes) {
            warn!(path = %path.display(), "source file does not start with a JPEG marker");
        }
        frames.push(ImageFrame::new(bytes));
    }

    if frames.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!(
                "no .jpg or .jpeg files under {} bytes in {}",
                max_payload,
                source.display()
            ),
        ));
    }
    Ok(frames)
}

fn has_jpeg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}
