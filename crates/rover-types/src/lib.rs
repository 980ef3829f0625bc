use thiserror::Error;

pub mod directive;
pub mod wire;

pub use directive::{Directive, DriveCommand, SteerCommand};
pub use wire::{ControlEvent, RelayFrame, StatusMessage, PUMP_KEEPALIVE_TOKEN};

/// Global error type spanning actuator faults, transport failures, and
/// internal channel breakage.
#[derive(Error, Debug)]
pub enum RoverError {
    #[error("Actuator fault on {component}: {details}")]
    Actuator { component: String, details: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rover_error_display() {
        let err = RoverError::Actuator {
            component: "steer_motor".to_string(),
            details: "driver not responding".to_string(),
        };
        assert!(err.to_string().contains("steer_motor"));

        let err2 = RoverError::Transport("handshake refused".to_string());
        assert!(err2.to_string().contains("handshake refused"));
    }
}
