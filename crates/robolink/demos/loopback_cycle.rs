//! One robot and one operator in a single process, talking over loopback.
//!
//! The robot thread serves telemetry and reads motor commands back; the
//! operator connects, answers each sample, and drops the link once halfway
//! through to show the recovery path.
//!
//! Run with:
//!   cargo run -p robolink --example loopback-cycle

use std::thread;

use robolink::link::{
    handle_failure, ClientConnection, Connection, Outcome, Received, ServerConnection,
};
use robolink::payload::{CommandRecord, Payload, TelemetryRecord};

const CYCLES: u32 = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut robot = ServerConnection::bind("127.0.0.1", 0)?;
    let port = robot.local_addr().port();
    eprintln!("robot listening on {}", robot.local_addr());

    let operator = thread::spawn(move || -> Result<(), robolink::link::LinkError> {
        let mut link = ClientConnection::connect("127.0.0.1", port)?;
        for cycle in 0..CYCLES {
            let Received::Payload(Payload::Telemetry(sample)) = link.receive()? else {
                continue;
            };
            eprintln!("operator: battery at {:.0}%", sample.voltage_battery_percent);

            if cycle == CYCLES / 2 {
                eprintln!("operator: dropping the link");
                link.close();
                link.attempt_reconnection()?;
                continue;
            }
            link.send(&Payload::Command(CommandRecord::new(60, 60)))?;
        }
        Ok(())
    });

    robot.wait_for_connection()?;
    let mut answered = 0;
    let mut battery = 100.0;
    while answered < CYCLES - 1 {
        let sample = Payload::Telemetry(TelemetryRecord {
            voltage_battery_percent: battery,
            ..TelemetryRecord::default()
        });
        battery -= 5.0;

        if let Err(err) = robot.send(&sample) {
            if let Outcome::Fatal(kind) = handle_failure(&mut robot, err.kind(), Some(&sample)) {
                return Err(format!("robot link lost: {kind}").into());
            }
            continue;
        }

        match robot.receive() {
            Ok(Received::Payload(Payload::Command(command))) => {
                answered += 1;
                eprintln!("robot: motors ma={} mb={}", command.ma, command.mb);
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("robot: {err} ({})", err.kind());
                if let Outcome::Fatal(kind) = handle_failure(&mut robot, err.kind(), None) {
                    return Err(format!("robot link lost: {kind}").into());
                }
            }
        }
    }

    operator
        .join()
        .map_err(|_| "operator thread panicked")??;
    Ok(())
}
