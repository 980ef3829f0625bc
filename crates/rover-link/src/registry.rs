//! [`ClientRegistry`] – live peers by role and by declared id, plus the relay
//! routing rule.
//!
//! A peer appears in at most one role-set and at most one id-slot.  Id slots
//! are last-writer-wins; unregistration removes a peer *by value* from every
//! structure, so a stale connection can never evict the newer holder of its
//! old id.  Delivery failures are swallowed: the failing peer is unregistered
//! and the fan-out continues, because one broken socket must never stop the
//! broadcast to everyone else.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use rover_types::RelayFrame;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use uuid::Uuid;

/// Shared handle to the registry.
pub type SharedRegistry = Arc<Mutex<ClientRegistry>>;

/// Sender half of a peer's outbox; the peer's writer task owns the receiver.
pub type PeerSender = mpsc::UnboundedSender<Message>;

// ────────────────────────────────────────────────────────────────────────────
// Role
// ────────────────────────────────────────────────────────────────────────────

/// A connecting peer's declared category.  Relay traffic always flows to the
/// opposite role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The driving app: joystick / keypad input.
    Controller,
    /// The camera / remote-view app.
    Viewer,
}

impl Role {
    /// Parse a role from the connection query string.  Accepts the legacy
    /// app spellings alongside the canonical names; anything else is `None`
    /// (the peer is accepted for dispatch but excluded from relay).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "controller" | "ctrl" | "android_ctrl" => Some(Role::Controller),
            "viewer" | "camera" | "android_rc" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn opposite(self) -> Role {
        match self {
            Role::Controller => Role::Viewer,
            Role::Viewer => Role::Controller,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Controller => write!(f, "controller"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ClientRegistry
// ────────────────────────────────────────────────────────────────────────────

struct PeerEntry {
    outbox: PeerSender,
}

/// Live-connection bookkeeping and relay routing for hub mode.
#[derive(Default)]
pub struct ClientRegistry {
    peers: HashMap<Uuid, PeerEntry>,
    by_role: HashMap<Role, HashSet<Uuid>>,
    by_id: HashMap<String, Uuid>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection.  A declared id overwrites any prior holder of that
    /// id (the displaced peer stays connected, it just loses the slot).
    pub fn register(
        &mut self,
        conn: Uuid,
        role: Option<Role>,
        client_id: Option<String>,
        outbox: PeerSender,
    ) {
        if let Some(role) = role {
            self.by_role.entry(role).or_default().insert(conn);
        }
        if let Some(id) = client_id {
            if let Some(previous) = self.by_id.insert(id.clone(), conn) {
                debug!(id = %id, displaced = %previous, "client id re-registered");
            }
        }
        self.peers.insert(conn, PeerEntry { outbox });
    }

    /// Remove a connection from every structure that references it, by
    /// value.  Safe to call for a peer whose id slot has since been taken
    /// over: only slots still pointing at `conn` are cleared.
    pub fn unregister(&mut self, conn: Uuid) {
        self.peers.remove(&conn);
        for members in self.by_role.values_mut() {
            members.remove(&conn);
        }
        self.by_id.retain(|_, holder| *holder != conn);
    }

    /// Deliver `frame` per the relay rule: unicast when its target id is
    /// registered, otherwise broadcast to every peer of the opposite role.
    /// Returns the number of successful deliveries; unreachable peers are
    /// unregistered along the way.
    pub fn route(&mut self, from: Role, frame: &RelayFrame) -> usize {
        let mut delivered = 0;
        let mut dead: Vec<Uuid> = Vec::new();

        let target = frame
            .target
            .as_deref()
            .and_then(|id| self.by_id.get(id).copied());

        if let Some(conn) = target {
            if self.try_send(conn, &frame.text) {
                delivered += 1;
            } else {
                dead.push(conn);
            }
        } else {
            let recipients: Vec<Uuid> = self
                .by_role
                .get(&from.opposite())
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default();
            for conn in recipients {
                if self.try_send(conn, &frame.text) {
                    delivered += 1;
                } else {
                    dead.push(conn);
                }
            }
        }

        for conn in dead {
            warn!(%conn, "peer unreachable, unregistering");
            self.unregister(conn);
        }
        delivered
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Number of live connections holding the given role.
    pub fn role_count(&self, role: Role) -> usize {
        self.by_role.get(&role).map_or(0, HashSet::len)
    }

    fn try_send(&self, conn: Uuid, text: &str) -> bool {
        match self.peers.get(&conn) {
            Some(peer) => peer
                .outbox
                .send(Message::Text(text.to_string().into()))
                .is_ok(),
            None => false,
        }
    }
}
