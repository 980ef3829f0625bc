//! The two fail-safe watchdog loops.
//!
//! Both are periodic checks with a pure `tick()` step wrapped in an
//! interval-driven `run()` loop, so tests can drive the state machine
//! directly without sleeping through real tick periods.
//!
//! * [`MotorWatchdog`] re-asserts the current directive to the actuator bank
//!   every tick (the hardware is non-latching) and forces a stop once the
//!   command goes stale, logging that transition exactly once per stale
//!   entry.
//! * [`PumpWatchdog`] is a one-directional cutout: it forces the pump off
//!   when the keep-alive goes stale and never switches it on.
//!
//! Actuator faults inside a tick are logged and the loop keeps running; a
//! watchdog that dies on the first driver hiccup protects nothing.

use std::time::Duration;

use rover_hal::{ActuatorBank, SharedActuators};
use rover_types::Directive;
use tracing::{error, info, warn};

use crate::config::WatchdogConfig;
use crate::lock;
use crate::state::SharedState;

// ────────────────────────────────────────────────────────────────────────────
// Motor watchdog
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of one motor watchdog tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorTick {
    /// Command fresh: the directive was re-asserted to both motors.
    Applied(Directive),
    /// Command just went stale: stop forced, transition logged.
    TimedOut,
    /// Still stale: stop re-asserted, no new transition.
    StillStopped,
}

/// Periodic re-assert / fail-stop loop for the two motors.
pub struct MotorWatchdog {
    state: SharedState,
    bank: SharedActuators,
    period: Duration,
    timeout: Duration,
    steer_duty: u8,
    drive_duty: u8,
    timed_out: bool,
}

impl MotorWatchdog {
    pub fn new(
        state: SharedState,
        bank: SharedActuators,
        cfg: &WatchdogConfig,
        steer_duty: u8,
        drive_duty: u8,
    ) -> Self {
        Self {
            state,
            bank,
            period: cfg.motor_tick,
            timeout: cfg.motor_timeout,
            steer_duty,
            drive_duty,
            // Boot starts in the stopped state: the hold-at-stop before the
            // first command is normal startup, not a timeout worth warning
            // about.
            timed_out: true,
        }
    }

    /// One check: force stop on staleness, otherwise re-assert the directive.
    pub fn tick(&mut self) -> MotorTick {
        let (stale, directive) = {
            let s = lock(&self.state);
            (s.motor_stale(self.timeout), s.directive())
        };

        if stale {
            let entering = !self.timed_out;
            self.timed_out = true;
            if entering {
                lock(&self.state).clear_directive();
                warn!(last = %directive, "motor command stale, forcing stop");
            }
            if let Err(e) = lock(&self.bank).stop_all() {
                error!(error = %e, "failed to force motor stop");
            }
            if entering {
                MotorTick::TimedOut
            } else {
                MotorTick::StillStopped
            }
        } else {
            self.timed_out = false;
            let (steer, drive) = directive.decompose();
            let mut bank = lock(&self.bank);
            if let Err(e) = bank.set_steer(steer, self.steer_duty) {
                error!(error = %e, "failed to apply steer command");
            }
            if let Err(e) = bank.set_drive(drive, self.drive_duty) {
                error!(error = %e, "failed to apply drive command");
            }
            MotorTick::Applied(directive)
        }
    }

    /// Run forever, ticking every `motor_tick`.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.tick();
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pump watchdog
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of one pump watchdog tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpTick {
    /// Pump off, nothing to watch.
    Idle,
    /// Pump on and the keep-alive is still fresh.
    Holding,
    /// Keep-alive stale: pump forced off.
    ForcedOff,
}

/// One-directional pump safety cutout.
pub struct PumpWatchdog {
    state: SharedState,
    bank: SharedActuators,
    period: Duration,
    timeout: Duration,
}

impl PumpWatchdog {
    pub fn new(state: SharedState, bank: SharedActuators, cfg: &WatchdogConfig) -> Self {
        Self {
            state,
            bank,
            period: cfg.pump_tick,
            timeout: cfg.pump_timeout,
        }
    }

    /// One check: force the pump off when its keep-alive has gone stale.
    /// Never switches the pump on.
    pub fn tick(&mut self) -> PumpTick {
        let (stale, active) = {
            let s = lock(&self.state);
            (s.pump_stale(self.timeout), s.pump_active())
        };

        if stale {
            lock(&self.state).set_pump(false);
            if let Err(e) = lock(&self.bank).set_pump(false) {
                error!(error = %e, "failed to force pump off");
            }
            info!("pump keep-alive stale, forcing off");
            PumpTick::ForcedOff
        } else if active {
            PumpTick::Holding
        } else {
            PumpTick::Idle
        }
    }

    /// Run forever, ticking every `pump_tick`.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.tick();
        }
    }
}
