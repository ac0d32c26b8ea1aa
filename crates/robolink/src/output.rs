use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use robolink_payload::{CommandRecord, ImageFrame, TelemetryRecord};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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
struct TelemetryOutput<'a> {
    kind: &'static str,
    peer: Option<String>,
    timestamp: String,
    #[serde(flatten)]
    record: &'a TelemetryRecord,
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    kind: &'static str,
    peer: Option<String>,
    timestamp: String,
    #[serde(flatten)]
    record: &'a CommandRecord,
}

#[derive(Serialize)]
struct ImageOutput {
    kind: &'static str,
    sequence: u64,
    size: usize,
    jpeg: bool,
    peer: Option<String>,
    timestamp: String,
}

/// End-of-run counters for a command loop.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub role: &'static str,
    pub sent: u64,
    pub received: u64,
    pub recoveries: u64,
    pub dropped: u64,
}

pub fn print_telemetry(record: &TelemetryRecord, peer: Option<SocketAddr>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&TelemetryOutput {
            kind: "telemetry",
            peer: peer.map(|addr| addr.to_string()),
            timestamp: now_unix_seconds(),
            record,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "VOLT", "TOTAL mA", "BATTERY", "TIME LEFT", "CPU", "RAM", "CPU TEMP", "WIFI",
                ])
                .add_row(vec![
                    format!("{:.2}", record.avg_volt),
                    format!("{:.1}", record.total_ma),
                    format!("{:.0}%", record.voltage_battery_percent),
                    format!("{:.1}h", record.time_left),
                    format!("{:.0}%", record.cpu_usage),
                    format!("{:.0}%", record.ram_usage),
                    format!("{:.1}C", record.cpu_temp),
                    wifi_label(record.wifi_signal),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "telemetry volt={:.2} ch=[{:.2},{:.2},{:.2}] mA={:.1} battery={:.0}% left={:.1}h cpu={:.0}% ram={:.0}% temp={:.1}C wifi={} peer={}",
                record.avg_volt,
                record.ch1volt,
                record.ch2volt,
                record.ch3volt,
                record.total_ma,
                record.voltage_battery_percent,
                record.time_left,
                record.cpu_usage,
                record.ram_usage,
                record.cpu_temp,
                wifi_label(record.wifi_signal),
                peer_label(peer),
            );
        }
    }
}

pub fn print_command(record: &CommandRecord, peer: Option<SocketAddr>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&CommandOutput {
            kind: "command",
            peer: peer.map(|addr| addr.to_string()),
            timestamp: now_unix_seconds(),
            record,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MOTOR A", "MOTOR B", "PEER"])
                .add_row(vec![
                    record.ma.to_string(),
                    record.mb.to_string(),
                    peer_label(peer),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "command ma={} mb={} peer={}",
                record.ma,
                record.mb,
                peer_label(peer)
            );
        }
    }
}

pub fn print_image(
    frame: &ImageFrame,
    sequence: u64,
    peer: Option<SocketAddr>,
    format: OutputFormat,
) {
    let jpeg = looks_like_jpeg(&frame.bytes);
    match format {
        OutputFormat::Json => print_json(&ImageOutput {
            kind: "image",
            sequence,
            size: frame.bytes.len(),
            jpeg,
            peer: peer.map(|addr| addr.to_string()),
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SIZE", "JPEG", "PEER"])
                .add_row(vec![
                    sequence.to_string(),
                    frame.bytes.len().to_string(),
                    jpeg.to_string(),
                    peer_label(peer),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "image #{sequence} size={} jpeg={jpeg} peer={}",
                frame.bytes.len(),
                peer_label(peer)
            );
        }
    }
}

pub fn print_summary(summary: &Summary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROLE", "SENT", "RECEIVED", "RECOVERIES", "DROPPED"])
                .add_row(vec![
                    summary.role.to_string(),
                    summary.sent.to_string(),
                    summary.received.to_string(),
                    summary.recoveries.to_string(),
                    summary.dropped.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}: sent={} received={} recoveries={} dropped={}",
                summary.role, summary.sent, summary.received, summary.recoveries, summary.dropped
            );
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// JPEG streams open with an SOI marker.
pub fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8])
}

fn wifi_label(signal: Option<i32>) -> String {
    signal.map_or_else(|| "n/a".to_string(), |dbm| format!("{dbm} dBm"))
}

fn peer_label(peer: Option<SocketAddr>) -> String {
    peer.map_or_else(|| "-".to_string(), |addr| addr.to_string())
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
    fn telemetry_json_flattens_wire_fields() {
        let record = TelemetryRecord {
            avg_volt: 12.0,
            wifi_signal: Some(-55),
            ..TelemetryRecord::default()
        };
        let out = TelemetryOutput {
            kind: "telemetry",
            peer: Some("10.0.0.2:4421".into()),
            timestamp: "0".into(),
            record: &record,
        };
        let value = serde_json::to_value(&out).expect("serialize");
        assert_eq!(value["kind"], "telemetry");
        assert_eq!(value["avgVolt"], 12.0);
        assert_eq!(value["wifiSignal"], -55);
        assert_eq!(value["peer"], "10.0.0.2:4421");
    }

    #[test]
    fn jpeg_detection() {
        assert!(looks_like_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!looks_like_jpeg(&[]));
        assert!(!looks_like_jpeg(b"GIF89a"));
    }

    #[test]
    fn wifi_unavailable_label() {
        assert_eq!(wifi_label(None), "n/a");
        assert_eq!(wifi_label(Some(-70)), "-70 dBm");
    }
}
