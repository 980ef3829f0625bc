//! [`CommandState`] – the single authoritative "what should the vehicle be
//! doing right now" record.
//!
//! Mutated only by the [`Dispatcher`][crate::Dispatcher]; the watchdog loops
//! read it every tick and may write only by clearing it back to the safe
//! defaults on timeout.  Motor directive and pump state are independent axes:
//! neither ever implies the other.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rover_types::Directive;

/// Shared handle to the command state.
pub type SharedState = Arc<Mutex<CommandState>>;

/// The currently-active command and the timestamps the watchdogs check
/// against.
#[derive(Debug)]
pub struct CommandState {
    active: Directive,
    last_command_at: Option<Instant>,
    pump_active: bool,
    last_pump_trigger_at: Option<Instant>,
}

impl CommandState {
    /// Fresh state: stopped, pump off, no command ever received.  The motor
    /// axis counts as stale until the first directive arrives, so the
    /// watchdog holds the vehicle stopped from boot.
    pub fn new() -> Self {
        Self {
            active: Directive::Stop,
            last_command_at: None,
            pump_active: false,
            last_pump_trigger_at: None,
        }
    }

    // ── Motor axis ──────────────────────────────────────────────────────────

    /// Store a new directive and stamp the arrival clock.  Re-assigning the
    /// stop directive stamps too: "stop" is a command, not an absence.
    pub fn set_directive(&mut self, directive: Directive) {
        self.active = directive;
        self.last_command_at = Some(Instant::now());
    }

    /// Watchdog-only: reset the directive to stop **without** stamping the
    /// clock, so the staleness that caused the reset remains observable.
    pub fn clear_directive(&mut self) {
        self.active = Directive::Stop;
    }

    pub fn directive(&self) -> Directive {
        self.active
    }

    /// `true` when no directive has arrived within `timeout` (or ever).
    pub fn motor_stale(&self, timeout: Duration) -> bool {
        match self.last_command_at {
            Some(at) => at.elapsed() > timeout,
            None => true,
        }
    }

    // ── Pump axis ───────────────────────────────────────────────────────────

    /// Pump keep-alive: stamp the trigger clock and, if the pump is currently
    /// off, switch it on.  Returns `true` only on the off→on transition so
    /// the caller issues the hardware "on" side effect at most once per
    /// activation.
    pub fn trigger_pump(&mut self) -> bool {
        self.last_pump_trigger_at = Some(Instant::now());
        if self.pump_active {
            false
        } else {
            self.pump_active = true;
            true
        }
    }

    /// Directly set the commanded pump state.  Used for explicit on/off
    /// commands and by the pump watchdog's forced cutout; does not touch the
    /// trigger clock.
    pub fn set_pump(&mut self, on: bool) {
        self.pump_active = on;
    }

    pub fn pump_active(&self) -> bool {
        self.pump_active
    }

    /// `true` when the pump is commanded on, has been triggered at least
    /// once, and the most recent trigger is older than `timeout`.
    pub fn pump_stale(&self, timeout: Duration) -> bool {
        self.pump_active
            && matches!(self.last_pump_trigger_at, Some(at) if at.elapsed() > timeout)
    }
}

impl Default for CommandState {
    fn default() -> Self {
        Self::new()
    }
}
