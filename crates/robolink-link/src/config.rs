use std::time::Duration;

use robolink_frame::FrameConfig;

/// Default bound on a connect or reconnect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between refused reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(250);

/// Controls connection and recovery behavior.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Upper bound on the initial client connect, and on the whole window a
    /// client spends trying to reconnect.
    pub connect_timeout: Duration,
    /// Pause between reconnect attempts that the peer refused.
    pub reconnect_interval: Duration,
    /// Disable Nagle's algorithm on peer sockets.
    pub nodelay: bool,
    /// Framing limits and optional per-operation I/O timeouts.
    pub frame: FrameConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            nodelay: true,
            frame: FrameConfig::default(),
        }
    }
}
