//! Executes state machine intents against the audio collaborators

use tracing::{info, trace, warn};

use super::{AudioControl, CuePlayer};
use crate::events::Intent;

/// Runs intents one at a time, in order
///
/// Failures are logged and swallowed: the state machine's view of the mic
/// stays optimistic and the listener keeps running.
pub struct IntentDispatcher<A, P> {
    audio: A,
    player: P,
    cues_enabled: bool,
}

impl<A: AudioControl, P: CuePlayer> IntentDispatcher<A, P> {
    pub fn new(audio: A, player: P, cues_enabled: bool) -> Self {
        Self {
            audio,
            player,
            cues_enabled,
        }
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Execute a single intent
    pub async fn dispatch(&self, intent: Intent) {
        trace!(%intent, "dispatching");

        let result = match intent {
            Intent::EnableMic => self.audio.enable_mic().await,
            Intent::DisableMic => self.audio.disable_mic().await,
            Intent::ToggleSinkMute => {
                info!("toggle sound");
                self.audio.toggle_sink_mute().await
            }
            Intent::PlaySound(cue) => {
                if !self.cues_enabled {
                    return;
                }
                self.player.play(cue)
            }
        };

        if let Err(e) = result {
            warn!(%intent, error = %e, "intent failed");
        }
    }

    /// Execute intents in order, each completing before the next starts
    pub async fn dispatch_all(&self, intents: impl IntoIterator<Item = Intent>) {
        for intent in intents {
            self.dispatch(intent).await;
        }
    }
}
