//! Watchdog timing configuration.

use std::time::Duration;

/// Tick periods and staleness timeouts for the two watchdog loops.
///
/// Each timeout must exceed its tick period by a healthy margin; the defaults
/// keep a 10× margin for the motors and 8× for the pump.  The pump timeout is
/// deliberately much shorter than the motor timeout: a stuck-on water pump is
/// the worse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub motor_tick: Duration,
    pub motor_timeout: Duration,
    pub pump_tick: Duration,
    pub pump_timeout: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            motor_tick: Duration::from_millis(100),
            motor_timeout: Duration::from_millis(1000),
            pump_tick: Duration::from_millis(50),
            pump_timeout: Duration::from_millis(400),
        }
    }
}

impl WatchdogConfig {
    /// Build from millisecond values (the shape the config file uses).
    pub fn from_millis(
        motor_tick_ms: u64,
        motor_timeout_ms: u64,
        pump_tick_ms: u64,
        pump_timeout_ms: u64,
    ) -> Self {
        Self {
            motor_tick: Duration::from_millis(motor_tick_ms),
            motor_timeout: Duration::from_millis(motor_timeout_ms),
            pump_tick: Duration::from_millis(pump_tick_ms),
            pump_timeout: Duration::from_millis(pump_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_timings() {
        let cfg = WatchdogConfig::default();
        assert_eq!(cfg.motor_tick, Duration::from_millis(100));
        assert_eq!(cfg.motor_timeout, Duration::from_secs(1));
        assert_eq!(cfg.pump_tick, Duration::from_millis(50));
        assert_eq!(cfg.pump_timeout, Duration::from_millis(400));
    }

    #[test]
    fn timeouts_exceed_tick_periods() {
        let cfg = WatchdogConfig::default();
        assert!(cfg.motor_timeout > cfg.motor_tick * 2);
        assert!(cfg.pump_timeout > cfg.pump_tick * 2);
    }

    #[test]
    fn from_millis_builds_the_same_durations() {
        let cfg = WatchdogConfig::from_millis(100, 1000, 50, 400);
        assert_eq!(cfg, WatchdogConfig::default());
    }
}
