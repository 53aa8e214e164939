//! ptt-daemon: push-to-talk for the default microphone
//!
//! Listens to every keyboard through evdev and:
//! - unmutes the default source while the PTT key is held
//! - toggles PTT mode on a key combination (the mic stays open while PTT is off)
//! - toggles mute on the default sink on another combination
//!
//! Mute control goes through `pactl`, sound cues through `paplay`.

#[cfg(not(target_os = "linux"))]
compile_error!("ptt-daemon reads keyboards through evdev and only builds on Linux");

mod audio;
mod config;
mod events;
mod hotkey;
mod lifecycle;
mod state;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::audio::{AudioControl, IntentDispatcher, Pactl, Paplay};
use crate::config::Config;
use crate::hotkey::linux::{discover_keyboards, unreachable_keys};
use crate::lifecycle::ShutdownSignal;
use crate::state::StateMachine;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Initialize logging
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "ptt-daemon starting");

    let mut shutdown = ShutdownSignal::new().context("failed to register signal handlers")?;

    let player = Paplay::new(config.sounds_dir.clone());
    if config.sound_cues {
        for path in player.missing_cues() {
            warn!(path = %path.display(), "sound cue file not found");
        }
    }
    let dispatcher = IntentDispatcher::new(Pactl::new(), player, config.sound_cues);

    let source = match dispatcher.audio().default_source_name().await {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "could not read default audio source");
            "unknown".to_string()
        }
    };
    info!(%source, predicates = %config.predicates, "start listening");

    for key in unreachable_keys(config.predicates.keys()) {
        warn!(%key, "no input device reports this key, the binding will never fire");
    }

    // Device tasks -> state machine
    let keyboards = discover_keyboards(&config.devices);
    let (mut listener, event_rx) = lifecycle::startup_sequence(keyboards, &dispatcher).await?;

    let mut state_machine = StateMachine::new(config.predicates.clone());

    info!(
        devices = listener.device_count(),
        "daemon initialized, entering main loop"
    );

    tokio::select! {
        _ = state_machine.run(event_rx, &dispatcher) => {
            warn!("all keyboard devices disconnected");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    lifecycle::shutdown_sequence(&mut listener, &mut state_machine, &dispatcher).await;

    info!("ptt-daemon stopped");

    Ok(())
}
