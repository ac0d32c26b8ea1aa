use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One JPEG-encoded camera frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageFrame {
    pub bytes: Bytes,
}

impl ImageFrame {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Power and host health sample sent from the robot to the operator.
///
/// Field names on the wire follow the established camelCase schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub ch1volt: f64,
    pub ch2volt: f64,
    pub ch3volt: f64,
    pub ch1ma: f64,
    pub ch2ma: f64,
    pub ch3ma: f64,
    pub avg_volt: f64,
    pub avg_ma: f64,
    pub total_ma: f64,
    /// Estimated hours of battery left.
    pub time_left: f64,
    /// Battery capacity in mAh.
    pub batt_size: f64,
    pub voltage_battery_percent: f64,
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub cpu_temp: f64,
    /// WiFi signal level in dBm; `None` when the host cannot report it.
    pub wifi_signal: Option<i32>,
}

impl TelemetryRecord {
    /// Wire name of the first field holding NaN or an infinity, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("ch1volt", self.ch1volt),
            ("ch2volt", self.ch2volt),
            ("ch3volt", self.ch3volt),
            ("ch1ma", self.ch1ma),
            ("ch2ma", self.ch2ma),
            ("ch3ma", self.ch3ma),
            ("avgVolt", self.avg_volt),
            ("avgMa", self.avg_ma),
            ("totalMa", self.total_ma),
            ("timeLeft", self.time_left),
            ("battSize", self.batt_size),
            ("voltageBatteryPercent", self.voltage_battery_percent),
            ("cpuUsage", self.cpu_usage),
            ("ramUsage", self.ram_usage),
            ("cpuTemp", self.cpu_temp),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(field, _)| field)
    }
}

/// Motor command sent from the operator to the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandRecord {
    pub ma: i32,
    pub mb: i32,
}

impl CommandRecord {
    pub fn new(ma: i32, mb: i32) -> Self {
        Self { ma, mb }
    }
}

/// Any object the link can carry in one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Image(ImageFrame),
    Telemetry(TelemetryRecord),
    Command(CommandRecord),
}

impl Payload {
    /// Short schema name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Image(_) => "image",
            Payload::Telemetry(_) => "telemetry",
            Payload::Command(_) => "command",
        }
    }
}

impl From<ImageFrame> for Payload {
    fn from(frame: ImageFrame) -> Self {
        Payload::Image(frame)
    }
}

impl From<TelemetryRecord> for Payload {
    fn from(record: TelemetryRecord) -> Self {
        Payload::Telemetry(record)
    }
}

impl From<CommandRecord> for Payload {
    fn from(record: CommandRecord) -> Self {
        Payload::Command(record)
    }
}
