//! Hardware abstraction for the two-motor vehicle and its pump.
//!
//! The rest of the stack only ever talks to the [`ActuatorBank`] trait, so
//! pin-level drivers can be swapped without touching control logic.  Two
//! implementations ship in-tree: [`TraceActuators`] (logs command edges, used
//! when no hardware driver is wired in) and [`SimActuators`] (records every
//! command for headless tests).

pub mod bank;
pub mod sim;
pub mod trace;

pub use bank::{clamp_duty, ActuatorBank, SharedActuators};
pub use sim::SimActuators;
pub use trace::TraceActuators;
