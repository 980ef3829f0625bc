//! Command & watchdog core.
//!
//! Owns the single source of truth for "what the vehicle should be doing
//! right now" ([`CommandState`]), the [`Dispatcher`] that is the only writer
//! of that state, and the two independent fail-safe [watchdog](watchdog)
//! loops that keep re-driving the actuators and force a safe state when
//! control input stops arriving.
//!
//! Transports (hub relay or outbound uplink) stay out of this crate entirely:
//! they push raw frames into the queue created by [`command_queue`] and the
//! core does the rest.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::error;

pub mod config;
pub mod dispatch;
pub mod state;
pub mod watchdog;

pub use config::WatchdogConfig;
pub use dispatch::Dispatcher;
pub use state::{CommandState, SharedState};
pub use watchdog::{MotorTick, MotorWatchdog, PumpTick, PumpWatchdog};

use rover_hal::{ActuatorBank, SharedActuators};

/// Sender half of the raw-frame queue; this is the transport seam.  Both
/// deployment modes clone one of these and push every received frame into it.
pub type CommandSink = mpsc::UnboundedSender<String>;

/// Receiver half of the raw-frame queue, consumed by [`Dispatcher::run`].
pub type CommandSource = mpsc::UnboundedReceiver<String>;

/// Create the raw-frame queue connecting the transports to the dispatcher.
pub fn command_queue() -> (CommandSink, CommandSource) {
    mpsc::unbounded_channel()
}

/// Lock a shared-state mutex, recovering from poisoning.
///
/// A panic on some other task must not take the fail-safe loops down with it:
/// the watchdogs keep running on whatever state the poisoned lock holds.
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drive every actuator to its safe state and release the hardware.
///
/// Run on shutdown and on any path that abandons the control loops: both
/// motors stopped, pump off, driver released.  The command state is cleared
/// first so a still-running watchdog tick cannot re-assert a stale directive.
pub fn safe_shutdown(state: &SharedState, bank: &SharedActuators) {
    {
        let mut s = lock(state);
        s.clear_directive();
        s.set_pump(false);
    }
    let mut b = lock(bank);
    if let Err(e) = b.stop_all() {
        error!(error = %e, "failed to stop motors during shutdown");
    }
    if let Err(e) = b.set_pump(false) {
        error!(error = %e, "failed to switch pump off during shutdown");
    }
    b.release();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_hal::SimActuators;
    use rover_types::{Directive, DriveCommand, SteerCommand};
    use std::sync::Arc;

    #[test]
    fn safe_shutdown_forces_stop_and_pump_off_and_releases() {
        let state: SharedState = Arc::new(Mutex::new(CommandState::new()));
        let sim = Arc::new(Mutex::new(SimActuators::new()));
        let bank: SharedActuators = sim.clone();
        {
            let mut s = lock(&state);
            s.set_directive(Directive::Forward);
            assert!(s.trigger_pump());
        }
        {
            let mut b = lock(&bank);
            b.set_drive(DriveCommand::Forward, 100).unwrap();
            b.set_pump(true).unwrap();
        }

        safe_shutdown(&state, &bank);

        let s = lock(&state);
        assert!(s.directive().is_stop());
        assert!(!s.pump_active());
        drop(s);

        let recorded = lock(&sim);
        assert_eq!(recorded.steer(), (SteerCommand::Stop, 0));
        assert_eq!(recorded.drive(), (DriveCommand::Stop, 0));
        assert!(!recorded.pump());
        assert!(recorded.released());
    }

    #[test]
    fn lock_recovers_from_poisoning() {
        let mutex = Arc::new(Mutex::new(CommandState::new()));
        let poisoner = Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(mutex.is_poisoned());
        // Must not panic.
        let guard = lock(&mutex);
        assert!(guard.directive().is_stop());
    }

    #[test]
    fn command_queue_delivers_in_order() {
        let (tx, mut rx) = command_queue();
        tx.send("first".to_string()).unwrap();
        tx.send("second".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert_eq!(rx.try_recv().unwrap(), "second");
    }

    #[test]
    fn sim_bank_observable_through_shared_handle() {
        let sim = Arc::new(Mutex::new(SimActuators::new()));
        let bank: SharedActuators = sim.clone();
        lock(&bank).set_steer(SteerCommand::Left, 90).unwrap();
        assert_eq!(lock(&sim).steer(), (SteerCommand::Left, 90));
    }
}
