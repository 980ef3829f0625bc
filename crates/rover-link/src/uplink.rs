//! [`Uplink`] – client-mode connection to a remote relay hub.
//!
//! The uplink dials out, announces readiness, and feeds every received text
//! frame to the dispatcher queue.  It never gives up: each failed connection
//! or dropped session is retried after an exponentially growing, capped
//! delay.  Because a severed link leaves no one to send the pump-off command,
//! the pump is forced off on every disconnect before the retry sleep.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rover_core::{lock, CommandSink, SharedState};
use rover_hal::{ActuatorBank, SharedActuators};
use rover_types::StatusMessage;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

/// Greeting content announced to the hub on every successful connect.
const READY_TEXT: &str = "rover ready (motor+pump)";

// ────────────────────────────────────────────────────────────────────────────
// Backoff
// ────────────────────────────────────────────────────────────────────────────

/// Exponential reconnect backoff: 1s, 2s, 4s, 8s, then capped at 10s.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    initial: Duration,
    max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(10))
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial,
            initial,
            max,
        }
    }

    /// The delay to sleep before the next attempt.  Doubles the stored delay
    /// for the attempt after, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Drop back to the initial delay after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Uplink
// ────────────────────────────────────────────────────────────────────────────

/// Outbound WebSocket client for uplink mode.
pub struct Uplink {
    url: String,
    sink: CommandSink,
    state: SharedState,
    bank: SharedActuators,
}

impl Uplink {
    pub fn new(url: String, sink: CommandSink, state: SharedState, bank: SharedActuators) -> Self {
        Self {
            url,
            sink,
            state,
            bank,
        }
    }

    /// Connect-and-read forever.  Returns only when the dispatcher queue is
    /// gone, which means the process is shutting down.
    pub async fn run(self) {
        let mut backoff = Backoff::default();
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    backoff.reset();
                    info!(url = %self.url, "uplink connected");
                    if self.session(ws).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "uplink connect failed");
                }
            }
            self.force_pump_off();
            let delay = backoff.next_delay();
            info!(delay_s = delay.as_secs(), "uplink retrying");
            tokio::time::sleep(delay).await;
        }
    }

    /// One connected session.  `Err` means the dispatcher is gone.
    async fn session(
        &self,
        ws: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> Result<(), ()> {
        let (mut ws_tx, mut ws_rx) = ws.split();
        if ws_tx
            .send(Message::Text(StatusMessage::ready(READY_TEXT).to_text().into()))
            .await
            .is_err()
        {
            return Ok(());
        }

        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if self.sink.send(text.to_string()).is_err() {
                        return Err(());
                    }
                }
                Ok(Message::Ping(payload)) => {
                    if ws_tx.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "uplink read error");
                    break;
                }
            }
        }
        info!("uplink session ended");
        Ok(())
    }

    /// With the link down no pump-off command can arrive, so apply one here.
    fn force_pump_off(&self) {
        lock(&self.state).set_pump(false);
        if let Err(e) = lock(&self.bank).set_pump(false) {
            warn!(error = %e, "failed to switch pump off after disconnect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_core::{command_queue, state::CommandState};
    use rover_hal::SimActuators;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[test]
    fn backoff_grows_and_caps() {
        let mut b = Backoff::default();
        let secs: Vec<u64> = (0..6).map(|_| b.next_delay().as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn backoff_reset_restarts_the_sequence() {
        let mut b = Backoff::default();
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn session_announces_ready_and_queues_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // One-shot hub: greet back the frames we want the uplink to queue,
        // then close.
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let hello = match ws.next().await.unwrap().unwrap() {
                Message::Text(t) => t.to_string(),
                other => panic!("expected text greeting, got {other:?}"),
            };
            let parsed: serde_json::Value = serde_json::from_str(&hello).unwrap();
            assert_eq!(parsed["type"], "status");
            ws.send(Message::Text(r#"{"Type":"Con","Value":"left"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let (sink, mut source) = command_queue();
        let state: SharedState = Arc::new(Mutex::new(CommandState::new()));
        let bank: SharedActuators = Arc::new(Mutex::new(SimActuators::new()));
        let uplink = Uplink::new(format!("ws://{addr}/ws"), sink, state, bank);

        let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        uplink.session(ws).await.unwrap();

        assert_eq!(source.recv().await.unwrap(), r#"{"Type":"Con","Value":"left"}"#);
    }

    #[tokio::test]
    async fn session_answers_hub_pings() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let hub = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await; // ready greeting
            ws.send(Message::Ping(b"hb".to_vec().into())).await.unwrap();
            let pong = loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Pong(payload) => break payload,
                    _ => {}
                }
            };
            assert_eq!(&pong[..], b"hb");
            ws.close(None).await.unwrap();
        });

        let (sink, _source) = command_queue();
        let state: SharedState = Arc::new(Mutex::new(CommandState::new()));
        let bank: SharedActuators = Arc::new(Mutex::new(SimActuators::new()));
        let uplink = Uplink::new(format!("ws://{addr}/ws"), sink, state, bank);

        let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        uplink.session(ws).await.unwrap();
        hub.await.unwrap();
    }

    #[tokio::test]
    async fn pump_is_forced_off_when_the_link_drops() {
        let (sink, _source) = command_queue();
        let state: SharedState = Arc::new(Mutex::new(CommandState::new()));
        let sim = Arc::new(Mutex::new(SimActuators::new()));
        let bank: SharedActuators = sim.clone();

        state.lock().unwrap().trigger_pump();
        sim.lock().unwrap().set_pump(true).unwrap();

        let uplink = Uplink::new("ws://unused".into(), sink, state.clone(), bank);
        uplink.force_pump_off();

        assert!(!state.lock().unwrap().pump_active());
        assert!(!sim.lock().unwrap().pump());
    }
}
