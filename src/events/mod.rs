//! Intents emitted by the state machine
//!
//! An intent is a side-effect request; the caller executes it against the
//! audio collaborators in the order it was emitted.

/// Short sound effects played on mode changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Played when the PTT key opens or closes the mic
    Click,
    /// Played when PTT mode is toggled
    Snap,
}

impl SoundCue {
    /// File name of the cue inside the sounds directory
    pub fn file_name(self) -> &'static str {
        match self {
            SoundCue::Click => "button.wav",
            SoundCue::Snap => "snap.wav",
        }
    }

    pub const ALL: [SoundCue; 2] = [SoundCue::Click, SoundCue::Snap];
}

/// Side-effect requests emitted by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Unmute the default source
    EnableMic,

    /// Mute the default source
    DisableMic,

    /// Toggle mute on the default sink
    ToggleSinkMute,

    /// Play a sound cue
    PlaySound(SoundCue),
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::EnableMic => write!(f, "ENABLE_MIC"),
            Intent::DisableMic => write!(f, "DISABLE_MIC"),
            Intent::ToggleSinkMute => write!(f, "TOGGLE_SINK_MUTE"),
            Intent::PlaySound(cue) => write!(f, "PLAY_SOUND ({})", cue.file_name()),
        }
    }
}
