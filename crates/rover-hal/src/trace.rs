//! [`TraceActuators`] – logging actuator bank.
//!
//! The default driver when no hardware backend is wired in: every command is
//! applied to in-memory state and transitions are logged via `tracing`.
//! Re-assertions of the current command are silent so a 10 Hz watchdog loop
//! does not flood the log.

use rover_types::{DriveCommand, RoverError, SteerCommand};
use tracing::{debug, info};

use crate::bank::{clamp_duty, ActuatorBank};

/// Actuator bank that logs command edges instead of driving pins.
#[derive(Debug, Default)]
pub struct TraceActuators {
    steer: Option<(SteerCommand, u8)>,
    drive: Option<(DriveCommand, u8)>,
    pump: bool,
}

impl TraceActuators {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActuatorBank for TraceActuators {
    fn set_steer(&mut self, cmd: SteerCommand, duty: u8) -> Result<(), RoverError> {
        let next = (cmd, clamp_duty(duty));
        if self.steer != Some(next) {
            debug!(steer = %next.0, duty = next.1, "steer motor");
            self.steer = Some(next);
        }
        Ok(())
    }

    fn set_drive(&mut self, cmd: DriveCommand, duty: u8) -> Result<(), RoverError> {
        let next = (cmd, clamp_duty(duty));
        if self.drive != Some(next) {
            debug!(drive = %next.0, duty = next.1, "drive motor");
            self.drive = Some(next);
        }
        Ok(())
    }

    fn set_pump(&mut self, on: bool) -> Result<(), RoverError> {
        if self.pump != on {
            info!(pump = on, "pump");
            self.pump = on;
        }
        Ok(())
    }

    fn release(&mut self) {
        info!("actuators released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_bank_applies_commands() {
        let mut bank = TraceActuators::new();
        bank.set_steer(SteerCommand::Left, 100).unwrap();
        bank.set_drive(DriveCommand::Forward, 100).unwrap();
        bank.set_pump(true).unwrap();
        assert_eq!(bank.steer, Some((SteerCommand::Left, 100)));
        assert_eq!(bank.drive, Some((DriveCommand::Forward, 100)));
        assert!(bank.pump);
    }

    #[test]
    fn trace_bank_stop_all_via_default_impl() {
        let mut bank = TraceActuators::new();
        bank.set_drive(DriveCommand::Back, 100).unwrap();
        bank.stop_all().unwrap();
        assert_eq!(bank.drive, Some((DriveCommand::Stop, 0)));
        assert_eq!(bank.steer, Some((SteerCommand::Stop, 0)));
    }
}
