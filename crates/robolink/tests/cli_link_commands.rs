#![cfg(feature = "cli")]

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use robolink_link::{ClientConnection, Connection, Received, ServerConnection};
use robolink_payload::{CommandRecord, ImageFrame, Payload, TelemetryRecord};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "robolink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn free_port() -> u16 {
    let probe = TcpListener::bind("127.0.0.1:0").expect("probe should bind");
    probe.local_addr().expect("probe addr").port()
}

fn robolink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_robolink"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn wait_for_connect(port: u16, timeout: Duration) -> ClientConnection {
    let start = Instant::now();
    loop {
        match ClientConnection::connect("127.0.0.1", port) {
            Ok(conn) => return conn,
            Err(err) => {
                if start.elapsed() >= timeout {
                    panic!("connect timeout: {err}");
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

fn expect_payload(received: Received) -> Payload {
    match received {
        Received::Payload(payload) => payload,
        Received::Reconnected => panic!("unexpected reconnect"),
    }
}

#[test]
fn version_prints_package_version() {
    let output = robolink().arg("version").output().expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("robolink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn control_answers_each_telemetry_sample() {
    let mut server = ServerConnection::bind("127.0.0.1", 0).expect("server should bind");
    let port = server.local_addr().port();

    let child = robolink()
        .args(["--format", "json", "control", "127.0.0.1"])
        .args(["--port", &port.to_string()])
        .args(["--ma", "60", "--mb", "60", "--count", "2"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("control should start");

    server.wait_for_connection().expect("control should connect");
    for volts in [11.5, 11.75] {
        let record = TelemetryRecord {
            avg_volt: volts,
            wifi_signal: Some(-48),
            ..TelemetryRecord::default()
        };
        server
            .send(&Payload::Telemetry(record))
            .expect("telemetry should send");
        let reply = expect_payload(server.receive().expect("command should arrive"));
        assert_eq!(reply, Payload::Command(CommandRecord::new(60, 60)));
    }

    let output = child.wait_with_output().expect("control should exit");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 3, "two samples and a summary");
    assert_eq!(lines[0]["kind"], "telemetry");
    assert_eq!(lines[0]["avgVolt"], 11.5);
    assert_eq!(lines[1]["avgVolt"], 11.75);
    assert_eq!(lines[1]["wifiSignal"], -48);
    assert_eq!(lines[2]["role"], "control");
    assert_eq!(lines[2]["sent"], 2);
    assert_eq!(lines[2]["received"], 2);
}

#[test]
fn telemetry_sends_record_then_prints_command() {
    let dir = unique_temp_dir("telemetry");
    let record_path = dir.join("record.json");
    let record = TelemetryRecord {
        ch1volt: 12.4,
        cpu_temp: 51.5,
        wifi_signal: None,
        ..TelemetryRecord::default()
    };
    std::fs::write(
        &record_path,
        serde_json::to_vec(&record).expect("record should serialize"),
    )
    .expect("record file should be writable");

    let port = free_port();
    let child = robolink()
        .args(["--format", "json", "telemetry", "127.0.0.1"])
        .args(["--port", &port.to_string(), "--count", "1"])
        .arg("--record")
        .arg(&record_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("telemetry should start");

    let mut client = wait_for_connect(port, Duration::from_secs(5));
    let sample = expect_payload(client.receive().expect("telemetry should arrive"));
    assert_eq!(sample, Payload::Telemetry(record));
    client
        .send(&Payload::Command(CommandRecord::new(-20, 35)))
        .expect("command should send");

    let output = child.wait_with_output().expect("telemetry should exit");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&output);
    assert_eq!(lines[0]["kind"], "command");
    assert_eq!(lines[0]["ma"], -20);
    assert_eq!(lines[0]["mb"], 35);
    assert_eq!(lines.last().expect("summary")["role"], "telemetry");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn camera_streams_source_frames_in_order() {
    let dir = unique_temp_dir("camera");
    std::fs::write(dir.join("000.jpg"), JPEG).expect("frame 0");
    let mut second = JPEG.to_vec();
    second.insert(2, 0x42);
    std::fs::write(dir.join("001.jpg"), &second).expect("frame 1");

    let port = free_port();
    let child = robolink()
        .args(["--format", "json", "camera", "127.0.0.1"])
        .args(["--port", &port.to_string(), "--count", "3", "--interval", "1ms"])
        .arg("--source")
        .arg(&dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("camera should start");

    let mut client = wait_for_connect(port, Duration::from_secs(5));
    let mut frames = Vec::new();
    for _ in 0..3 {
        match expect_payload(client.receive().expect("frame should arrive")) {
            Payload::Image(frame) => frames.push(frame),
            other => panic!("expected an image, got {}", other.kind()),
        }
    }
    assert_eq!(
        frames,
        vec![
            ImageFrame::new(JPEG.to_vec()),
            ImageFrame::new(second),
            ImageFrame::new(JPEG.to_vec()),
        ]
    );

    let output = child.wait_with_output().expect("camera should exit");
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.last().expect("summary")["sent"], 3);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn view_saves_latest_frame() {
    let dir = unique_temp_dir("view");
    let latest = dir.join("latest.jpg");

    let mut server = ServerConnection::bind("127.0.0.1", 0).expect("server should bind");
    let port = server.local_addr().port();

    let child = robolink()
        .args(["--format", "json", "view", "127.0.0.1"])
        .args(["--port", &port.to_string(), "--count", "2"])
        .arg("--output")
        .arg(&latest)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("view should start");

    server.wait_for_connection().expect("viewer should connect");
    server
        .send(&Payload::Image(ImageFrame::new(vec![0xFF, 0xD8, 1])))
        .expect("first frame");
    server
        .send(&Payload::Image(ImageFrame::new(JPEG.to_vec())))
        .expect("second frame");

    let output = child.wait_with_output().expect("view should exit");
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines[0]["kind"], "image");
    assert_eq!(lines[0]["size"], 3);
    assert_eq!(lines[1]["sequence"], 2);
    assert_eq!(lines[1]["jpeg"], true);
    assert_eq!(std::fs::read(&latest).expect("latest frame"), JPEG);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn telemetry_reaccepts_after_controller_drops() {
    let port = free_port();
    let child = robolink()
        .args(["--format", "json", "telemetry", "127.0.0.1"])
        .args(["--port", &port.to_string(), "--count", "2"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("telemetry should start");

    let mut first = wait_for_connect(port, Duration::from_secs(5));
    let sample = expect_payload(first.receive().expect("first sample should arrive"));
    assert!(matches!(sample, Payload::Telemetry(_)));
    first
        .send(&Payload::Command(CommandRecord::new(10, 10)))
        .expect("first command should send");
    first.close();
    drop(first);

    let mut second = wait_for_connect(port, Duration::from_secs(5));
    let sample = expect_payload(second.receive().expect("sample after re-accept"));
    assert!(matches!(sample, Payload::Telemetry(_)));
    second
        .send(&Payload::Command(CommandRecord::new(20, -20)))
        .expect("second command should send");

    let output = child.wait_with_output().expect("telemetry should exit");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 3, "two commands and a summary");
    assert_eq!(lines[0]["ma"], 10);
    assert_eq!(lines[1]["ma"], 20);
    assert_eq!(lines[1]["mb"], -20);
    assert_eq!(lines[2]["role"], "telemetry");
    assert_eq!(lines[2]["received"], 2);
    assert_eq!(lines[2]["recoveries"], 1);
    assert_eq!(lines[2]["dropped"], 0);
}

#[test]
fn view_rides_through_camera_restart() {
    let mut server = ServerConnection::bind("127.0.0.1", 0).expect("server should bind");
    let port = server.local_addr().port();

    let child = robolink()
        .args(["--format", "json", "view", "127.0.0.1"])
        .args(["--port", &port.to_string(), "--count", "2"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("view should start");

    server.wait_for_connection().expect("viewer should connect");
    server
        .send(&Payload::Image(ImageFrame::new(JPEG.to_vec())))
        .expect("first frame");
    server.close();

    server
        .wait_for_connection()
        .expect("viewer should reconnect");
    let mut after_restart = JPEG.to_vec();
    after_restart.insert(2, 0x7E);
    server
        .send(&Payload::Image(ImageFrame::new(after_restart.clone())))
        .expect("frame after restart");

    let output = child.wait_with_output().expect("view should exit");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 3, "two frames and a summary");
    assert_eq!(lines[0]["sequence"], 1);
    assert_eq!(lines[0]["size"], JPEG.len());
    assert_eq!(lines[1]["sequence"], 2);
    assert_eq!(lines[1]["size"], after_restart.len());
    assert_eq!(lines[2]["role"], "view");
    assert_eq!(lines[2]["received"], 2);
    assert_eq!(lines[2]["recoveries"], 1);
}

#[test]
fn view_without_server_exits_with_transport_error() {
    let port = free_port();
    let output = robolink()
        .args(["view", "127.0.0.1", "--port", &port.to_string()])
        .args(["--connect-timeout", "1s"])
        .output()
        .expect("view should run");

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn camera_with_empty_source_is_usage_error() {
    let dir = unique_temp_dir("empty-source");
    let output = robolink()
        .args(["camera", "127.0.0.1", "--port", &free_port().to_string()])
        .arg("--source")
        .arg(&dir)
        .output()
        .expect("camera should run");

    assert_eq!(output.status.code(), Some(64));
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn bad_duration_is_usage_error() {
    let output = robolink()
        .args(["control", "127.0.0.1", "--connect-timeout", "soon"])
        .output()
        .expect("control should run");

    assert_eq!(output.status.code(), Some(64));
}
