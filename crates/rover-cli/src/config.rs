//! Daemon configuration – reads `~/.roverd/config.toml`.

use rover_core::WatchdogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Which transport shape the daemon runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Host a WebSocket relay; controller and viewer apps connect inbound.
    #[default]
    Hub,
    /// Dial out to a central hub and reconnect on failure.
    Uplink,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Hub => write!(f, "hub"),
            Mode::Uplink => write!(f, "uplink"),
        }
    }
}

/// Persisted daemon configuration stored in `~/.roverd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transport shape: `hub` (host a relay) or `uplink` (dial out).
    #[serde(default)]
    pub mode: Mode,

    /// TCP port for the relay listener in hub mode.
    #[serde(default = "default_hub_port")]
    pub hub_port: u16,

    /// Hub WebSocket URL to dial in uplink mode.
    #[serde(default = "default_uplink_url")]
    pub uplink_url: String,

    /// Duty-cycle percentage for the steering motor.
    #[serde(default = "default_duty")]
    pub steer_duty: u8,

    /// Duty-cycle percentage for the drive motor.
    #[serde(default = "default_duty")]
    pub drive_duty: u8,

    /// Motor watchdog check period, milliseconds.
    #[serde(default = "default_motor_tick_ms")]
    pub motor_tick_ms: u64,

    /// Motor command staleness threshold, milliseconds.
    #[serde(default = "default_motor_timeout_ms")]
    pub motor_timeout_ms: u64,

    /// Pump watchdog check period, milliseconds.
    #[serde(default = "default_pump_tick_ms")]
    pub pump_tick_ms: u64,

    /// Pump keep-alive staleness threshold, milliseconds.
    #[serde(default = "default_pump_timeout_ms")]
    pub pump_timeout_ms: u64,
}

fn default_hub_port() -> u16 {
    9080
}
fn default_uplink_url() -> String {
    "ws://192.168.137.1:8080/ws/agent/rover".to_string()
}
fn default_duty() -> u8 {
    100
}
fn default_motor_tick_ms() -> u64 {
    100
}
fn default_motor_timeout_ms() -> u64 {
    1000
}
fn default_pump_tick_ms() -> u64 {
    50
}
fn default_pump_timeout_ms() -> u64 {
    400
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            hub_port: default_hub_port(),
            uplink_url: default_uplink_url(),
            steer_duty: default_duty(),
            drive_duty: default_duty(),
            motor_tick_ms: default_motor_tick_ms(),
            motor_timeout_ms: default_motor_timeout_ms(),
            pump_tick_ms: default_pump_tick_ms(),
            pump_timeout_ms: default_pump_timeout_ms(),
        }
    }
}

impl Config {
    /// The watchdog timing block of this configuration.
    pub fn watchdog(&self) -> WatchdogConfig {
        WatchdogConfig::from_millis(
            self.motor_tick_ms,
            self.motor_timeout_ms,
            self.pump_tick_ms,
            self.pump_timeout_ms,
        )
    }
}

/// Return the path to `~/.roverd/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".roverd").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ROVERD_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `ROVERD_MODE` | `mode` (`hub` or `uplink`) |
/// | `ROVERD_HUB_PORT` | `hub_port` |
/// | `ROVERD_UPLINK_URL` | `uplink_url` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ROVERD_MODE") {
        match v.to_lowercase().as_str() {
            "hub" => cfg.mode = Mode::Hub,
            "uplink" => cfg.mode = Mode::Uplink,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("ROVERD_HUB_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.hub_port = port;
    }
    if let Ok(v) = std::env::var("ROVERD_UPLINK_URL") {
        cfg.uplink_url = v;
    }
}
