//! `roverd` – relay and watchdog daemon for the rover.
//!
//! Wires the whole stack together:
//!
//! 1. Loads `~/.roverd/config.toml` (missing file means defaults) and applies
//!    `ROVERD_*` environment overrides.
//! 2. Drives the actuators to a safe posture before any network frame can
//!    arrive.
//! 3. Spawns the dispatcher and both watchdog loops, then the transport the
//!    configured mode calls for: a hub relay listener or an outbound uplink.
//! 4. On Ctrl-C / SIGTERM, tears the tasks down and runs the safe-shutdown
//!    sequence: motors stopped, pump off, driver released.

mod config;

use std::sync::{Arc, Mutex};

use rover_core::{
    command_queue, safe_shutdown, CommandState, Dispatcher, MotorWatchdog, PumpWatchdog,
    SharedState,
};
use rover_hal::{SharedActuators, TraceActuators};
use rover_link::{ClientRegistry, HubServer, Uplink};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set ROVERD_LOG_FORMAT=json to emit newline-delimited JSON logs suitable
    // for log aggregators.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ROVERD_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "roverd starting");

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            cfg
        }
        Ok(None) => {
            info!(
                path = %config::config_path().display(),
                "no config file, using defaults"
            );
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            error!(error = %e, "config unreadable, using defaults");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    info!(mode = %cfg.mode, "configuration resolved");

    // ── Shared state and actuators ────────────────────────────────────────
    let state: SharedState = Arc::new(Mutex::new(CommandState::new()));
    let bank: SharedActuators = Arc::new(Mutex::new(TraceActuators::new()));

    // Safe posture before the first frame can arrive.
    safe_shutdown(&state, &bank);

    // ── Core tasks ────────────────────────────────────────────────────────
    let (sink, source) = command_queue();
    let watchdog_cfg = cfg.watchdog();

    let mut tasks = Vec::new();
    tasks.push(tokio::spawn(
        Dispatcher::new(state.clone(), bank.clone()).run(source),
    ));
    tasks.push(tokio::spawn(
        MotorWatchdog::new(
            state.clone(),
            bank.clone(),
            &watchdog_cfg,
            cfg.steer_duty,
            cfg.drive_duty,
        )
        .run(),
    ));
    tasks.push(tokio::spawn(
        PumpWatchdog::new(state.clone(), bank.clone(), &watchdog_cfg).run(),
    ));

    // ── Transport ─────────────────────────────────────────────────────────
    match cfg.mode {
        config::Mode::Hub => {
            let registry = Arc::new(Mutex::new(ClientRegistry::new()));
            let server = HubServer::new(registry, sink).with_port(cfg.hub_port);
            tasks.push(tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    error!(error = %e, "hub relay failed");
                }
            }));
        }
        config::Mode::Uplink => {
            let uplink = Uplink::new(cfg.uplink_url.clone(), sink, state.clone(), bank.clone());
            tasks.push(tokio::spawn(uplink.run()));
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────
    wait_for_shutdown_signal().await;
    info!("shutdown signal received");

    for task in &tasks {
        task.abort();
    }
    safe_shutdown(&state, &bank);
    info!("actuators safe, exiting");
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                error!(error = %e, "cannot install SIGTERM handler");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "cannot wait for Ctrl-C");
                }
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot wait for Ctrl-C");
    }
}
