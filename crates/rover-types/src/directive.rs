//! [`Directive`] – the normalized motor command vocabulary.
//!
//! Every inbound control token, whatever its spelling, normalizes to exactly
//! one of the nine directives below.  [`Directive::from_token`] is total: a
//! token it cannot interpret degrades to [`Directive::Stop`], which is the
//! safe default for a vehicle that must never keep moving on garbage input.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Axis commands
// ────────────────────────────────────────────────────────────────────────────

/// Discrete command for the steering motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerCommand {
    Left,
    Right,
    Stop,
}

/// Discrete command for the drive motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveCommand {
    Forward,
    Back,
    Stop,
}

impl std::fmt::Display for SteerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SteerCommand::Left => write!(f, "left"),
            SteerCommand::Right => write!(f, "right"),
            SteerCommand::Stop => write!(f, "stop"),
        }
    }
}

impl std::fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveCommand::Forward => write!(f, "forward"),
            DriveCommand::Back => write!(f, "back"),
            DriveCommand::Stop => write!(f, "stop"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Directive
// ────────────────────────────────────────────────────────────────────────────

/// A normalized direction command for the vehicle.
///
/// Diagonals are not blended vectors: they decompose into two independent
/// single-axis commands applied together (see [`Directive::decompose`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    #[default]
    Stop,
    Forward,
    Back,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    BackLeft,
    BackRight,
}

impl Directive {
    /// Map a free-form token to a directive.
    ///
    /// Case-insensitive and alias-tolerant: `"forward"`, `"up"` and `"w"` all
    /// mean [`Directive::Forward`]; diagonals accept both hyphenated and
    /// underscore spellings.  Anything unrecognized – including the empty
    /// string and the explicit `"stop"`/`"none"` tokens – resolves to
    /// [`Directive::Stop`].  This function never fails.
    pub fn from_token(token: &str) -> Directive {
        match token.trim().to_lowercase().as_str() {
            "forward" | "up" | "w" => Directive::Forward,
            "back" | "down" | "s" => Directive::Back,
            "left" | "a" => Directive::Left,
            "right" | "d" => Directive::Right,
            "forward-left" | "up_left" => Directive::ForwardLeft,
            "forward-right" | "up_right" => Directive::ForwardRight,
            "back-left" | "down_left" => Directive::BackLeft,
            "back-right" | "down_right" => Directive::BackRight,
            _ => Directive::Stop,
        }
    }

    /// Decompose into the two independent axis commands the actuator layer
    /// understands: `(steering, drive)`.
    pub fn decompose(self) -> (SteerCommand, DriveCommand) {
        match self {
            Directive::Stop => (SteerCommand::Stop, DriveCommand::Stop),
            Directive::Forward => (SteerCommand::Stop, DriveCommand::Forward),
            Directive::Back => (SteerCommand::Stop, DriveCommand::Back),
            Directive::Left => (SteerCommand::Left, DriveCommand::Stop),
            Directive::Right => (SteerCommand::Right, DriveCommand::Stop),
            Directive::ForwardLeft => (SteerCommand::Left, DriveCommand::Forward),
            Directive::ForwardRight => (SteerCommand::Right, DriveCommand::Forward),
            Directive::BackLeft => (SteerCommand::Left, DriveCommand::Back),
            Directive::BackRight => (SteerCommand::Right, DriveCommand::Back),
        }
    }

    /// `true` for the stop directive.
    pub fn is_stop(self) -> bool {
        self == Directive::Stop
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Directive::Stop => "stop",
            Directive::Forward => "forward",
            Directive::Back => "back",
            Directive::Left => "left",
            Directive::Right => "right",
            Directive::ForwardLeft => "forward-left",
            Directive::ForwardRight => "forward-right",
            Directive::BackLeft => "back-left",
            Directive::BackRight => "back-right",
        };
        write!(f, "{s}")
    }
}
