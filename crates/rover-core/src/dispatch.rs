//! [`Dispatcher`] – the only writer of [`CommandState`][crate::CommandState].
//!
//! Drains the raw-frame queue fed by whichever transport is active,
//! normalizes each frame through
//! [`ControlEvent::from_raw`][rover_types::ControlEvent::from_raw], and
//! applies the result.  The pump-ON side effect lives here and nowhere else:
//! the watchdog may only ever switch the pump off.

use rover_hal::{ActuatorBank, SharedActuators};
use rover_types::ControlEvent;
use tracing::{debug, info, trace};

use crate::lock;
use crate::state::SharedState;
use crate::CommandSource;

pub struct Dispatcher {
    state: SharedState,
    bank: SharedActuators,
}

impl Dispatcher {
    pub fn new(state: SharedState, bank: SharedActuators) -> Self {
        Self { state, bank }
    }

    /// Normalize and apply one raw frame.
    pub fn dispatch_raw(&self, raw: &str) {
        self.apply(ControlEvent::from_raw(raw));
    }

    /// Apply one canonical control event.
    pub fn apply(&self, event: ControlEvent) {
        match event {
            ControlEvent::Directive(directive) => {
                debug!(%directive, "command update");
                lock(&self.state).set_directive(directive);
                // The motor watchdog picks this up on its next tick; the
                // dispatcher never drives the motors directly.
            }
            ControlEvent::PumpTrigger => {
                let turned_on = lock(&self.state).trigger_pump();
                if turned_on {
                    info!("pump on");
                    if let Err(e) = lock(&self.bank).set_pump(true) {
                        tracing::error!(error = %e, "failed to switch pump on");
                    }
                }
            }
            ControlEvent::PumpOff => {
                let was_on = {
                    let mut s = lock(&self.state);
                    let was_on = s.pump_active();
                    s.set_pump(false);
                    was_on
                };
                if was_on {
                    info!("pump off");
                }
                if let Err(e) = lock(&self.bank).set_pump(false) {
                    tracing::error!(error = %e, "failed to switch pump off");
                }
            }
            ControlEvent::Ignored => {
                trace!("frame carries no control meaning, ignored");
            }
        }
    }

    /// Consume the queue until every sender is gone.  Frames from one
    /// connection arrive here in receipt order.
    pub async fn run(self, mut source: CommandSource) {
        while let Some(raw) = source.recv().await {
            self.dispatch_raw(&raw);
        }
        debug!("command queue closed, dispatcher exiting");
    }
}
