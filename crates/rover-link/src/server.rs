//! [`HubServer`] – hub-mode WebSocket relay.
//!
//! Each inbound connection declares a role (`type=`) and an optional id
//! (`id=`) on the query string, gets a `{"type":"status","content":"ready"}`
//! greeting, and is then served by one read loop plus one writer task.  Every
//! received text frame is pushed onto the dispatcher queue *and* relayed
//! through the [`ClientRegistry`] – relay and control extraction are
//! independent concerns operating on the same byte stream.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use rover_core::{lock, CommandSink};
use rover_types::{RelayFrame, RoverError, StatusMessage};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::registry::{Role, SharedRegistry};

/// Default TCP port for the hub relay.
pub const DEFAULT_PORT: u16 = 9080;

/// Greeting content sent to every peer right after the handshake.
const READY_TEXT: &str = "ready";

/// WebSocket relay server for hub mode.
pub struct HubServer {
    registry: SharedRegistry,
    sink: CommandSink,
    port: u16,
}

impl HubServer {
    /// Create a server on the [`DEFAULT_PORT`].
    pub fn new(registry: SharedRegistry, sink: CommandSink) -> Self {
        Self {
            registry,
            sink,
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Bind and serve until a fatal listener error.
    ///
    /// # Errors
    ///
    /// Returns [`RoverError::Transport`] if the TCP listener cannot bind.
    pub async fn run(self) -> Result<(), RoverError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RoverError::Transport(format!("bind error on {addr}: {e}")))?;
        info!(%addr, "hub relay listening");
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), RoverError> {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let registry = self.registry.clone();
                    let sink = self.sink.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_peer(stream, peer, registry, sink).await {
                            error!(%peer, error = %e, "peer connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Connection parameters
// ────────────────────────────────────────────────────────────────────────────

/// Role and id declared on the connection query string.
#[derive(Debug, Default, PartialEq, Eq)]
struct ConnectParams {
    role: Option<Role>,
    client_id: Option<String>,
}

impl ConnectParams {
    fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.split('&') {
            let mut kv = pair.splitn(2, '=');
            let key = kv.next().unwrap_or("");
            let value = percent_decode(kv.next().unwrap_or(""));
            match key {
                "type" | "role" => params.role = Role::parse(&value),
                "id" if !value.is_empty() => params.client_id = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// Decode one query-string component: `%XX` escapes and `+` for space.
/// Ids must register in decoded form, or a decoded `to` field in a relay
/// frame could never match them.  Malformed escapes pass through verbatim.
fn percent_decode(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                match (
                    bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                    bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
                ) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ────────────────────────────────────────────────────────────────────────────
// Per-connection handler
// ────────────────────────────────────────────────────────────────────────────

async fn handle_peer(
    stream: TcpStream,
    peer: SocketAddr,
    registry: SharedRegistry,
    sink: CommandSink,
) -> Result<(), RoverError> {
    // Capture the request query during the handshake; tungstenite only hands
    // us the HTTP request inside the header callback.
    let mut query: Option<String> = None;
    let ws = accept_hdr_async(stream, |req: &Request, resp: Response| {
        query = req.uri().query().map(str::to_string);
        Ok(resp)
    })
    .await
    .map_err(|e| RoverError::Transport(format!("handshake from {peer}: {e}")))?;

    let params = ConnectParams::parse(query.as_deref().unwrap_or(""));
    let conn = Uuid::new_v4();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<Message>();
    let greeter = outbox.clone();

    {
        lock(&registry).register(conn, params.role, params.client_id.clone(), outbox);
    }
    info!(%conn, %peer, role = ?params.role, id = ?params.client_id, "peer connected");

    let (mut ws_tx, mut ws_rx) = ws.split();

    // Writer task: the only place this socket is written, so relay fan-out
    // never blocks on a slow peer.
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let _ = greeter.send(Message::Text(StatusMessage::ready(READY_TEXT).to_text().into()));

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let raw = text.as_str();
                if sink.send(raw.to_string()).is_err() {
                    // Dispatcher gone; the process is shutting down.
                    break;
                }
                if let Some(role) = params.role {
                    let frame = RelayFrame::from_raw(raw);
                    lock(&registry).route(role, &frame);
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = greeter.send(Message::Pong(payload));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%conn, error = %e, "read error");
                break;
            }
        }
    }

    lock(&registry).unregister(conn);
    info!(%conn, %peer, "peer disconnected");
    drop(greeter); // last outbox sender: lets the writer task drain and exit
    let _ = writer.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClientRegistry;
    use rover_core::command_queue;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_tungstenite::connect_async;

    #[test]
    fn connect_params_parse_role_and_id() {
        let p = ConnectParams::parse("type=controller&id=pad1");
        assert_eq!(p.role, Some(Role::Controller));
        assert_eq!(p.client_id.as_deref(), Some("pad1"));
    }

    #[test]
    fn connect_params_accept_legacy_role_names() {
        assert_eq!(
            ConnectParams::parse("type=android_rc").role,
            Some(Role::Viewer)
        );
        assert_eq!(
            ConnectParams::parse("role=android_ctrl").role,
            Some(Role::Controller)
        );
    }

    #[test]
    fn connect_params_decode_percent_escapes() {
        let p = ConnectParams::parse("type=viewer&id=cam%201");
        assert_eq!(p.client_id.as_deref(), Some("cam 1"));
        assert_eq!(ConnectParams::parse("id=cam+1").client_id.as_deref(), Some("cam 1"));
        // Malformed escapes register verbatim rather than failing the connect.
        assert_eq!(ConnectParams::parse("id=cam%2").client_id.as_deref(), Some("cam%2"));
        assert_eq!(ConnectParams::parse("id=100%25").client_id.as_deref(), Some("100%"));
    }

    #[test]
    fn connect_params_tolerate_junk() {
        let p = ConnectParams::parse("type=unknown&id=&noise");
        assert_eq!(p.role, None);
        assert_eq!(p.client_id, None);
        assert_eq!(ConnectParams::parse(""), ConnectParams::default());
    }

    #[test]
    fn default_port_and_builder_override() {
        let registry = Arc::new(Mutex::new(ClientRegistry::new()));
        let (sink, _source) = command_queue();
        let server = HubServer::new(registry, sink);
        assert_eq!(server.port(), DEFAULT_PORT);
        assert_eq!(server.with_port(9999).port(), 9999);
    }

    // ── Loopback tests over real sockets ────────────────────────────────────

    async fn start_hub() -> (SocketAddr, rover_core::CommandSource) {
        let registry = Arc::new(Mutex::new(ClientRegistry::new()));
        let (sink, source) = command_queue();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(HubServer::new(registry, sink).serve(listener));
        (addr, source)
    }

    fn text_frame(msg: Message) -> String {
        match msg {
            Message::Text(t) => t.to_string(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn peers_are_greeted_with_a_ready_status() {
        let (addr, _source) = start_hub().await;
        let (mut viewer, _) = connect_async(format!("ws://{addr}/ws?type=viewer"))
            .await
            .unwrap();
        let greeting = text_frame(viewer.next().await.unwrap().unwrap());
        let parsed: serde_json::Value = serde_json::from_str(&greeting).unwrap();
        assert_eq!(parsed["type"], "status");
        assert_eq!(parsed["content"], "ready");
    }

    #[tokio::test]
    async fn pings_are_answered_with_pongs() {
        let (addr, _source) = start_hub().await;
        let (mut peer, _) = connect_async(format!("ws://{addr}/ws?type=viewer"))
            .await
            .unwrap();
        let _ = peer.next().await; // greeting

        peer.send(Message::Ping(b"hb".to_vec().into())).await.unwrap();
        let pong = loop {
            match peer.next().await.unwrap().unwrap() {
                Message::Pong(payload) => break payload,
                _ => {}
            }
        };
        assert_eq!(&pong[..], b"hb");
    }

    #[tokio::test]
    async fn controller_frames_are_relayed_to_viewers_and_queued() {
        let (addr, mut source) = start_hub().await;

        let (mut viewer, _) = connect_async(format!("ws://{addr}/ws?type=viewer&id=cam1"))
            .await
            .unwrap();
        let _ = viewer.next().await; // greeting: registration is complete

        let (mut ctrl, _) = connect_async(format!("ws://{addr}/ws?type=controller"))
            .await
            .unwrap();
        let _ = ctrl.next().await;

        let raw = r#"{"Type":"Con","Value":"forward"}"#;
        ctrl.send(Message::Text(raw.into())).await.unwrap();

        let relayed = text_frame(viewer.next().await.unwrap().unwrap());
        assert_eq!(relayed, raw);

        let queued = source.recv().await.unwrap();
        assert_eq!(queued, raw);
    }

    #[tokio::test]
    async fn unicast_to_one_viewer_skips_the_other() {
        let (addr, mut source) = start_hub().await;

        let (mut cam1, _) = connect_async(format!("ws://{addr}/ws?type=viewer&id=cam1"))
            .await
            .unwrap();
        let _ = cam1.next().await;
        let (mut cam2, _) = connect_async(format!("ws://{addr}/ws?type=viewer&id=cam2"))
            .await
            .unwrap();
        let _ = cam2.next().await;
        let (mut ctrl, _) = connect_async(format!("ws://{addr}/ws?type=controller"))
            .await
            .unwrap();
        let _ = ctrl.next().await;

        let raw = r#"{"Type":"Con","Value":"up","to":"cam2"}"#;
        ctrl.send(Message::Text(raw.into())).await.unwrap();

        let relayed = text_frame(cam2.next().await.unwrap().unwrap());
        assert_eq!(relayed, raw);
        assert_eq!(source.recv().await.unwrap(), raw);

        // cam1 must see nothing beyond its greeting.
        let nothing = tokio::time::timeout(Duration::from_millis(100), cam1.next()).await;
        assert!(nothing.is_err(), "unicast leaked to a non-target viewer");
    }

    #[tokio::test]
    async fn roleless_peer_frames_still_reach_the_dispatcher() {
        let (addr, mut source) = start_hub().await;
        let (mut stray, _) = connect_async(format!("ws://{addr}/ws?type=mystery"))
            .await
            .unwrap();
        let _ = stray.next().await;

        stray
            .send(Message::Text(r#"{"Type":"Con","Value":"back"}"#.into()))
            .await
            .unwrap();
        assert_eq!(
            source.recv().await.unwrap(),
            r#"{"Type":"Con","Value":"back"}"#
        );
    }
}
