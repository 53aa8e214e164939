//! PulseAudio / PipeWire control through `pactl` and `paplay`

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use super::{AudioControl, AudioError, CuePlayer};
use crate::events::SoundCue;

const DEFAULT_SOURCE: &str = "@DEFAULT_SOURCE@";
const DEFAULT_SINK: &str = "@DEFAULT_SINK@";

/// Controls the default source and sink with `pactl`
#[derive(Debug, Clone)]
pub struct Pactl {
    program: String,
}

impl Pactl {
    /// Use `pactl` from `PATH`
    pub fn new() -> Self {
        Self::with_program("pactl")
    }

    /// Use a different executable in place of `pactl`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `pactl` with `args`, returning its stdout on success
    async fn run(&self, args: &[&str]) -> Result<String, AudioError> {
        let command = format!("{} {}", self.program, args.join(" "));
        trace!(%command, "running");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AudioError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Pactl {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioControl for Pactl {
    async fn enable_mic(&self) -> Result<(), AudioError> {
        self.run(&["set-source-mute", DEFAULT_SOURCE, "0"]).await?;
        Ok(())
    }

    async fn disable_mic(&self) -> Result<(), AudioError> {
        self.run(&["set-source-mute", DEFAULT_SOURCE, "1"]).await?;
        Ok(())
    }

    async fn toggle_sink_mute(&self) -> Result<(), AudioError> {
        self.run(&["set-sink-mute", DEFAULT_SINK, "toggle"]).await?;
        Ok(())
    }

    async fn default_source_name(&self) -> Result<String, AudioError> {
        let stdout = self.run(&["get-default-source"]).await?;
        let name = stdout.trim();
        if name.is_empty() {
            return Err(AudioError::NoDefaultSource);
        }
        Ok(name.to_string())
    }
}

/// Plays sound cues from a directory with `paplay`
#[derive(Debug, Clone)]
pub struct Paplay {
    program: String,
    sounds_dir: PathBuf,
}

impl Paplay {
    /// Play cues from `sounds_dir` with `paplay` from `PATH`
    pub fn new(sounds_dir: impl Into<PathBuf>) -> Self {
        Self::with_program("paplay", sounds_dir)
    }

    /// Use a different executable in place of `paplay`
    pub fn with_program(program: impl Into<String>, sounds_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            sounds_dir: sounds_dir.into(),
        }
    }

    /// Cue files that do not exist in the sounds directory
    pub fn missing_cues(&self) -> Vec<PathBuf> {
        SoundCue::ALL
            .into_iter()
            .map(|cue| self.cue_path(cue))
            .filter(|path| !path.is_file())
            .collect()
    }

    /// Full path of the file played for `cue`
    pub fn cue_path(&self, cue: SoundCue) -> PathBuf {
        self.sounds_dir.join(cue.file_name())
    }
}

impl CuePlayer for Paplay {
    fn play(&self, cue: SoundCue) -> Result<(), AudioError> {
        let path = self.cue_path(cue);
        let mut child = Command::new(&self.program)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Reap the player in the background so playback never blocks events
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    debug!(path = %path.display(), %status, "sound cue player failed");
                }
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "sound cue player lost"),
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pactl_success() {
        let pactl = Pactl::with_program("true");
        assert!(pactl.enable_mic().await.is_ok());
        assert!(pactl.disable_mic().await.is_ok());
        assert!(pactl.toggle_sink_mute().await.is_ok());
    }

    #[tokio::test]
    async fn test_pactl_nonzero_exit() {
        let pactl = Pactl::with_program("false");
        let err = pactl.enable_mic().await.unwrap_err();
        assert!(matches!(err, AudioError::CommandFailed { .. }));
        assert!(err.to_string().contains("set-source-mute @DEFAULT_SOURCE@ 0"));
    }

    #[tokio::test]
    async fn test_pactl_missing_program() {
        let pactl = Pactl::with_program("/nonexistent/pactl");
        let err = pactl.disable_mic().await.unwrap_err();
        assert!(matches!(err, AudioError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_default_source_name_is_trimmed_stdout() {
        // `echo get-default-source` prints its argument back
        let pactl = Pactl::with_program("echo");
        let name = pactl.default_source_name().await.unwrap();
        assert_eq!(name, "get-default-source");
    }

    #[tokio::test]
    async fn test_default_source_name_empty() {
        let pactl = Pactl::with_program("true");
        let err = pactl.default_source_name().await.unwrap_err();
        assert!(matches!(err, AudioError::NoDefaultSource));
    }

    #[test]
    fn test_cue_paths() {
        let player = Paplay::new("/usr/share/ptt-daemon/sounds");
        assert_eq!(
            player.cue_path(SoundCue::Click),
            PathBuf::from("/usr/share/ptt-daemon/sounds/button.wav")
        );
        assert_eq!(
            player.cue_path(SoundCue::Snap),
            PathBuf::from("/usr/share/ptt-daemon/sounds/snap.wav")
        );
    }

    #[test]
    fn test_missing_cues() {
        let player = Paplay::new("/nonexistent/sounds");
        assert_eq!(
            player.missing_cues(),
            vec![
                PathBuf::from("/nonexistent/sounds/button.wav"),
                PathBuf::from("/nonexistent/sounds/snap.wav"),
            ]
        );
    }

    #[tokio::test]
    async fn test_play_does_not_wait() {
        let player = Paplay::with_program("true", "/tmp");
        assert!(player.play(SoundCue::Click).is_ok());

        let player = Paplay::with_program("/nonexistent/paplay", "/tmp");
        assert!(matches!(
            player.play(SoundCue::Snap),
            Err(AudioError::Spawn { .. })
        ));
    }
}
