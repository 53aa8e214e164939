//! Audio control collaborators
//!
//! The state machine never touches the sound server. It emits intents that
//! an [`IntentDispatcher`] executes against an [`AudioControl`] and a
//! [`CuePlayer`].

mod dispatch;
mod pulse;

use std::future::Future;

pub use dispatch::IntentDispatcher;
pub use pulse::{Paplay, Pactl};

#[cfg(test)]
pub(crate) use dispatch::tests::recording_dispatcher;

use crate::events::SoundCue;

/// Mute control over the default source and sink
pub trait AudioControl: Send + Sync {
    /// Unmute the default source
    fn enable_mic(&self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Mute the default source
    fn disable_mic(&self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Toggle mute on the default sink
    fn toggle_sink_mute(&self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Name of the current default source
    fn default_source_name(&self) -> impl Future<Output = Result<String, AudioError>> + Send;
}

/// Fire-and-forget sound effect playback
pub trait CuePlayer: Send + Sync {
    /// Start playing `cue` without waiting for it to finish
    fn play(&self, cue: SoundCue) -> Result<(), AudioError>;
}

/// Errors from audio control and playback
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("no default audio source reported")]
    NoDefaultSource,
}
