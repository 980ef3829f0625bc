//! Wire-message taxonomy and normalization.
//!
//! Controllers speak several dialects that accumulated across app versions:
//!
//! * the current shape `{"Type":"Con"|"Jet","Value":…,"to"?:…}`,
//! * the legacy shapes `{"type":"rc","command":…}`, `{"command":…}` and
//!   `{"content":…}`,
//! * and bare non-JSON text.
//!
//! [`ControlEvent::from_raw`] is the single normalization step that collapses
//! all of them into one canonical directive-or-pump event before anything
//! touches the command state.  Unparsable payloads are treated as a bare
//! directive token rather than dropped, so plain-text senders keep working.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Directive;

/// The reserved pump keep-alive token.
///
/// On the legacy `content` path and on bare text this word is a pump trigger,
/// never a directive.  On the explicit `Con` path it is *not* reserved and
/// falls through the directive table (degrading to stop).
pub const PUMP_KEEPALIVE_TOKEN: &str = "hose_spray";

/// The `Jet` value that activates the pump; any other value deactivates it.
const PUMP_LAUNCH_TOKEN: &str = "launch";

// ────────────────────────────────────────────────────────────────────────────
// ControlEvent
// ────────────────────────────────────────────────────────────────────────────

/// Canonical form of one inbound control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Update the active motor directive.
    Directive(Directive),
    /// Pump keep-alive: refresh the trigger clock and switch the pump on if
    /// it is currently off.
    PumpTrigger,
    /// Explicit pump-off command.
    PumpOff,
    /// A frame with no control meaning (status chatter, relay-only traffic).
    Ignored,
}

impl ControlEvent {
    /// Normalize one raw frame into a [`ControlEvent`].
    ///
    /// Recognition order: `Type=Con` / `Type=Jet`, then the legacy `command`
    /// field (the `{"type":"rc"}` wrapper carries its payload there too),
    /// then the legacy `content` field, then bare text.  JSON objects that
    /// match none of these shapes carry no control meaning and are ignored.
    ///
    /// A frame that declares a `Type` is handled entirely by the `Type` arm:
    /// an unrecognized `Type` is ignored even when legacy fields sit in the
    /// same object, since a sender speaking the current dialect gets the
    /// current dialect's rules.
    pub fn from_raw(raw: &str) -> ControlEvent {
        let Ok(json) = serde_json::from_str::<Value>(raw) else {
            return Self::from_bare(raw);
        };
        let Some(obj) = json.as_object() else {
            // Valid JSON that is not an object (numbers, arrays, quoted
            // strings) carries no recognizable command shape.
            return ControlEvent::Ignored;
        };

        if let Some(kind) = obj.get("Type").and_then(Value::as_str) {
            let value = obj.get("Value").map(stringify).unwrap_or_default();
            let value = value.to_lowercase();
            return match kind {
                "Con" => ControlEvent::Directive(Directive::from_token(&value)),
                "Jet" => {
                    if value == PUMP_LAUNCH_TOKEN {
                        ControlEvent::PumpTrigger
                    } else {
                        ControlEvent::PumpOff
                    }
                }
                _ => ControlEvent::Ignored,
            };
        }

        if let Some(cmd) = obj.get("command") {
            return ControlEvent::Directive(Directive::from_token(&stringify(cmd)));
        }

        if let Some(content) = obj.get("content") {
            let value = stringify(content);
            if value.eq_ignore_ascii_case(PUMP_KEEPALIVE_TOKEN) {
                return ControlEvent::PumpTrigger;
            }
            return ControlEvent::Directive(Directive::from_token(&value));
        }

        ControlEvent::Ignored
    }

    fn from_bare(raw: &str) -> ControlEvent {
        let token = raw.trim();
        if token.eq_ignore_ascii_case(PUMP_KEEPALIVE_TOKEN) {
            return ControlEvent::PumpTrigger;
        }
        ControlEvent::Directive(Directive::from_token(token))
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RelayFrame
// ────────────────────────────────────────────────────────────────────────────

/// The relay-side view of one inbound frame: the text to forward and the
/// optional unicast target extracted from its `to` field.
///
/// Non-JSON frames are wrapped as `{"Type":"RAW","Value":…}` before relaying
/// so that every peer only ever sees JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFrame {
    pub text: String,
    pub target: Option<String>,
}

impl RelayFrame {
    pub fn from_raw(raw: &str) -> RelayFrame {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => RelayFrame {
                text: raw.to_string(),
                target: obj.get("to").and_then(Value::as_str).map(str::to_string),
            },
            _ => RelayFrame {
                text: serde_json::json!({ "Type": "RAW", "Value": raw }).to_string(),
                target: None,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StatusMessage
// ────────────────────────────────────────────────────────────────────────────

/// The `{"type":"status","content":…}` frame sent to a peer immediately after
/// its connection is established, in both hub and uplink modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl StatusMessage {
    pub fn ready(content: impl Into<String>) -> StatusMessage {
        StatusMessage {
            kind: "status".to_string(),
            content: content.into(),
        }
    }

    /// Serialize to wire text.  Infallible: the message is a flat pair of
    /// strings.
    pub fn to_text(&self) -> String {
        serde_json::json!({ "type": self.kind, "content": self.content }).to_string()
    }
}
