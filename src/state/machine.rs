//! Core push-to-talk state machine
//!
//! Interprets a stream of key presses and releases against the configured
//! predicates and returns the intents to execute, in order.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::audio::{AudioControl, CuePlayer, IntentDispatcher};
use crate::events::{Intent, SoundCue};
use crate::hotkey::{HeldKeys, KeyCombination, KeyEvent, KeyId};

/// Whether the PTT key gates the mic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PttMode {
    /// The mic opens only while the PTT key is held
    #[default]
    Enabled,
    /// PTT gating is suspended; the mic stays as the toggle left it
    Disabled,
}

impl fmt::Display for PttMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PttMode::Enabled => write!(f, "Enabled"),
            PttMode::Disabled => write!(f, "Disabled"),
        }
    }
}

/// Key predicates, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicates {
    /// Momentary push-to-talk key
    pub ptt_key: KeyId,
    /// Combination that flips [`PttMode`]
    pub toggle_combo: Option<KeyCombination>,
    /// Combination that toggles sink mute
    pub mute_combo: Option<KeyCombination>,
}

impl Predicates {
    /// Predicates with only a PTT key configured
    pub fn new(ptt_key: KeyId) -> Self {
        Self {
            ptt_key,
            toggle_combo: None,
            mute_combo: None,
        }
    }

    /// Every key named by the PTT key and the combinations
    pub fn keys(&self) -> impl Iterator<Item = &KeyId> {
        std::iter::once(&self.ptt_key)
            .chain(self.toggle_combo.iter().flat_map(KeyCombination::iter))
            .chain(self.mute_combo.iter().flat_map(KeyCombination::iter))
    }
}

impl fmt::Display for Predicates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PTT key: {}", self.ptt_key)?;
        match &self.toggle_combo {
            Some(combo) => write!(f, ", PTT toggle: {combo}")?,
            None => write!(f, ", PTT toggle: none")?,
        }
        match &self.mute_combo {
            Some(combo) => write!(f, ", mute sound: {combo}"),
            None => write!(f, ", mute sound: none"),
        }
    }
}

/// The push-to-talk state machine
///
/// Presses are edge-triggered: a press for a key that is already held is
/// treated as a repeat and produces nothing.
pub struct StateMachine {
    predicates: Predicates,
    held: HeldKeys,
    mode: PttMode,
}

impl StateMachine {
    /// Create a state machine with nothing held and PTT enabled
    pub fn new(predicates: Predicates) -> Self {
        Self {
            predicates,
            held: HeldKeys::new(),
            mode: PttMode::Enabled,
        }
    }

    /// Get the current PTT mode
    #[cfg(test)]
    pub fn mode(&self) -> PttMode {
        self.mode
    }

    /// Get the keys currently held
    #[cfg(test)]
    pub fn held(&self) -> &HeldKeys {
        &self.held
    }

    /// Get the configured predicates
    #[cfg(test)]
    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    /// Run the state machine until every event sender is gone
    ///
    /// Each event's intents are fully dispatched before the next event is
    /// received.
    pub async fn run<A, P>(
        &mut self,
        mut event_rx: mpsc::Receiver<KeyEvent>,
        dispatcher: &IntentDispatcher<A, P>,
    ) where
        A: AudioControl,
        P: CuePlayer,
    {
        info!(mode = %self.mode, "state machine started");

        while let Some(event) = event_rx.recv().await {
            let intents = self.handle(event);
            dispatcher.dispatch_all(intents).await;
        }

        info!("state machine stopped");
    }

    /// Process one normalized key event
    pub fn handle(&mut self, event: KeyEvent) -> Vec<Intent> {
        match event {
            KeyEvent::Pressed(key) => self.on_press(key),
            KeyEvent::Released(key) => self.on_release(&key),
        }
    }

    /// Handle a key press
    ///
    /// A press of a key that is still held yields nothing. If a release was
    /// lost, the next real press of that key is swallowed as well and only
    /// its release brings the set back in sync.
    pub fn on_press(&mut self, key: KeyId) -> Vec<Intent> {
        let mut intents = Vec::new();

        if !self.held.press(key.clone()) {
            debug!(%key, "already held, ignoring repeat");
            return intents;
        }
        debug!(%key, held = ?self.held, "on_press");

        if self.mode == PttMode::Enabled && key == self.predicates.ptt_key {
            info!(%key, "enable mic");
            intents.push(Intent::PlaySound(SoundCue::Click));
            intents.push(Intent::EnableMic);
        }

        // Both combinations are matched against the keys held right now,
        // before the toggle reset
        let toggle_matched = Self::matches(self.predicates.toggle_combo.as_ref(), &self.held);
        let mute_matched = Self::matches(self.predicates.mute_combo.as_ref(), &self.held);

        if toggle_matched {
            self.toggle_mode(&mut intents);
            // Combination releases are not reliably delivered, so start over
            self.held.clear();
        }

        if mute_matched {
            intents.push(Intent::ToggleSinkMute);
        }

        intents
    }

    /// Handle a key release
    pub fn on_release(&mut self, key: &KeyId) -> Vec<Intent> {
        let mut intents = Vec::new();
        debug!(%key, "on_release");

        if self.mode == PttMode::Enabled && *key == self.predicates.ptt_key {
            info!(%key, "disable mic");
            intents.push(Intent::PlaySound(SoundCue::Click));
            intents.push(Intent::DisableMic);
        }

        self.held.release(key);
        intents
    }

    /// Final intents to run on shutdown; always mutes the mic
    pub fn shutdown(&mut self) -> Vec<Intent> {
        self.held.clear();
        vec![Intent::DisableMic]
    }

    fn matches(combo: Option<&KeyCombination>, held: &HeldKeys) -> bool {
        combo.is_some_and(|combo| combo.is_satisfied_by(held))
    }

    fn toggle_mode(&mut self, intents: &mut Vec<Intent>) {
        intents.push(Intent::PlaySound(SoundCue::Snap));

        let new_mode = match self.mode {
            PttMode::Enabled => {
                info!("disable PTT");
                intents.push(Intent::EnableMic);
                PttMode::Disabled
            }
            PttMode::Disabled => {
                info!("enable PTT");
                intents.push(Intent::DisableMic);
                PttMode::Enabled
            }
        };

        info!(from = %self.mode, to = %new_mode, "PTT mode transition");
        self.mode = new_mode;
    }
}
