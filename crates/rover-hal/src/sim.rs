//! [`SimActuators`] – recording actuator bank for headless tests.
//!
//! Records the most recent command on each axis and counts state transitions
//! so tests can assert on re-assertion behavior and pump idempotency without
//! any physical hardware.

use rover_types::{DriveCommand, RoverError, SteerCommand};

use crate::bank::{clamp_duty, ActuatorBank};

/// A simulated actuator bank.  Always succeeds.
#[derive(Debug)]
pub struct SimActuators {
    steer: (SteerCommand, u8),
    drive: (DriveCommand, u8),
    pump: bool,
    steer_calls: usize,
    drive_calls: usize,
    pump_on_edges: usize,
    released: bool,
}

impl SimActuators {
    pub fn new() -> Self {
        Self {
            steer: (SteerCommand::Stop, 0),
            drive: (DriveCommand::Stop, 0),
            pump: false,
            steer_calls: 0,
            drive_calls: 0,
            pump_on_edges: 0,
            released: false,
        }
    }

    /// Most recent steering command and its clamped duty.
    pub fn steer(&self) -> (SteerCommand, u8) {
        self.steer
    }

    /// Most recent drive command and its clamped duty.
    pub fn drive(&self) -> (DriveCommand, u8) {
        self.drive
    }

    pub fn pump(&self) -> bool {
        self.pump
    }

    /// Total number of `set_steer` calls, including re-assertions.
    pub fn steer_calls(&self) -> usize {
        self.steer_calls
    }

    /// Total number of `set_drive` calls, including re-assertions.
    pub fn drive_calls(&self) -> usize {
        self.drive_calls
    }

    /// Number of off→on pump transitions observed.
    pub fn pump_on_edges(&self) -> usize {
        self.pump_on_edges
    }

    pub fn released(&self) -> bool {
        self.released
    }
}

impl Default for SimActuators {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorBank for SimActuators {
    fn set_steer(&mut self, cmd: SteerCommand, duty: u8) -> Result<(), RoverError> {
        self.steer = (cmd, clamp_duty(duty));
        self.steer_calls += 1;
        Ok(())
    }

    fn set_drive(&mut self, cmd: DriveCommand, duty: u8) -> Result<(), RoverError> {
        self.drive = (cmd, clamp_duty(duty));
        self.drive_calls += 1;
        Ok(())
    }

    fn set_pump(&mut self, on: bool) -> Result<(), RoverError> {
        if on && !self.pump {
            self.pump_on_edges += 1;
        }
        self.pump = on;
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_records_last_command_per_axis() {
        let mut sim = SimActuators::new();
        sim.set_steer(SteerCommand::Left, 80).unwrap();
        sim.set_drive(DriveCommand::Forward, 100).unwrap();
        assert_eq!(sim.steer(), (SteerCommand::Left, 80));
        assert_eq!(sim.drive(), (DriveCommand::Forward, 100));
    }

    #[test]
    fn sim_clamps_duty_at_the_boundary() {
        let mut sim = SimActuators::new();
        sim.set_steer(SteerCommand::Right, 250).unwrap();
        assert_eq!(sim.steer(), (SteerCommand::Right, 100));
    }

    #[test]
    fn sim_counts_pump_on_edges_not_calls() {
        let mut sim = SimActuators::new();
        sim.set_pump(true).unwrap();
        sim.set_pump(true).unwrap();
        sim.set_pump(false).unwrap();
        sim.set_pump(true).unwrap();
        assert_eq!(sim.pump_on_edges(), 2);
        assert!(sim.pump());
    }

    #[test]
    fn default_stop_all_stops_both_motors() {
        let mut sim = SimActuators::new();
        sim.set_steer(SteerCommand::Left, 100).unwrap();
        sim.set_drive(DriveCommand::Back, 100).unwrap();
        sim.stop_all().unwrap();
        assert_eq!(sim.steer(), (SteerCommand::Stop, 0));
        assert_eq!(sim.drive(), (DriveCommand::Stop, 0));
    }

    #[test]
    fn stop_all_leaves_the_pump_alone() {
        let mut sim = SimActuators::new();
        sim.set_pump(true).unwrap();
        sim.stop_all().unwrap();
        assert!(sim.pump(), "pump and motors are independent axes");
    }

    #[test]
    fn release_is_recorded() {
        let mut sim = SimActuators::new();
        assert!(!sim.released());
        sim.release();
        assert!(sim.released());
    }
}
