//! [`ActuatorBank`] – the actuator driver seam.
//!
//! One trait covers the whole actuator surface of the vehicle: the steering
//! motor, the drive motor, and the on/off pump.  The hardware underneath is
//! assumed non-latching – most motor drivers need to be continuously
//! re-driven to be considered authoritative – which is why the watchdog loop
//! re-asserts the current command on every tick rather than edge-triggering.

use std::sync::{Arc, Mutex};

use rover_types::{DriveCommand, RoverError, SteerCommand};

/// Clamp a duty-cycle value to the accepted `0..=100` range.
///
/// Out-of-range values are clamped, never rejected.
pub fn clamp_duty(duty: u8) -> u8 {
    duty.min(100)
}

/// The complete actuator surface of the vehicle.
///
/// Implementations must clamp duty values via [`clamp_duty`] and must treat
/// every setter as idempotent: re-issuing the current command is the normal
/// case, not an error.
pub trait ActuatorBank: Send {
    /// Drive the steering motor.  `duty` is a percentage, clamped to 0–100.
    fn set_steer(&mut self, cmd: SteerCommand, duty: u8) -> Result<(), RoverError>;

    /// Drive the drive motor.  `duty` is a percentage, clamped to 0–100.
    fn set_drive(&mut self, cmd: DriveCommand, duty: u8) -> Result<(), RoverError>;

    /// Switch the pump on or off.
    fn set_pump(&mut self, on: bool) -> Result<(), RoverError>;

    /// Stop both motors.  The pump is not touched: motor and pump state are
    /// independent axes.
    fn stop_all(&mut self) -> Result<(), RoverError> {
        self.set_steer(SteerCommand::Stop, 0)?;
        self.set_drive(DriveCommand::Stop, 0)
    }

    /// Release the underlying hardware on shutdown.  Called exactly once,
    /// after the final stop/off sequence.
    fn release(&mut self) {}
}

/// Shared handle to the actuator bank.
///
/// Accesses are short and never span an await point; the mutex exists because
/// the watchdog loops, the dispatcher, and the transport tasks run on a
/// multi-threaded scheduler.
pub type SharedActuators = Arc<Mutex<dyn ActuatorBank>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_duty_passes_in_range_values() {
        assert_eq!(clamp_duty(0), 0);
        assert_eq!(clamp_duty(55), 55);
        assert_eq!(clamp_duty(100), 100);
    }

    #[test]
    fn clamp_duty_clamps_out_of_range_values() {
        assert_eq!(clamp_duty(101), 100);
        assert_eq!(clamp_duty(255), 100);
    }
}
