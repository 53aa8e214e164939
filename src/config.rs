//! Configuration loading from the command line and environment

use std::path::PathBuf;

use clap::Parser;

use crate::hotkey::{KeyCombination, KeyId, KeyParseError};
use crate::state::Predicates;

/// Push-to-talk daemon: mutes the default microphone unless the PTT key is held
#[derive(Debug, Parser)]
#[command(name = "ptt-daemon", version, about, long_about = None)]
pub struct Cli {
    /// Key that opens the mic while held (e.g. rightctrl)
    #[arg(long, visible_alias = "ppt_key", value_name = "KEY")]
    pub ptt_key: String,

    /// Combination that toggles PTT mode (e.g. rightctrl+f12)
    #[arg(long, visible_alias = "ppt_toggle_key", value_name = "KEY+KEY")]
    pub toggle_combo: Option<String>,

    /// Combination that toggles speaker mute (e.g. rightctrl+m)
    #[arg(long, visible_alias = "sound_toggle_key", value_name = "KEY+KEY")]
    pub mute_combo: Option<String>,

    /// Directory holding button.wav and snap.wav
    #[arg(long, env = "PTT_SOUNDS_DIR", value_name = "DIR")]
    pub sounds_dir: Option<PathBuf>,

    /// Never play sound cues
    #[arg(long)]
    pub no_sound_cues: bool,

    /// Listen only on this input device (repeatable)
    #[arg(long = "device", value_name = "PATH")]
    pub devices: Vec<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Key predicates driving the state machine
    pub predicates: Predicates,

    /// Directory for sound cue files
    pub sounds_dir: PathBuf,

    /// Whether sound cues are played
    pub sound_cues: bool,

    /// Explicit device nodes; empty means every keyboard
    pub devices: Vec<PathBuf>,

    /// Default to debug logging
    pub verbose: bool,
}

/// Errors from validating the command line
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PTT key {0:?}")]
    InvalidPttKey(String),

    #[error("invalid {option}: {source}")]
    InvalidCombination {
        option: &'static str,
        #[source]
        source: KeyParseError,
    },

    #[error("no sounds directory given and HOME is not set")]
    NoSoundsDir,
}

impl Config {
    /// Load configuration from the process arguments and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(Cli::parse())
    }

    /// Validate parsed arguments into a configuration
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let ptt_key = KeyId::from_name(&cli.ptt_key)
            .ok_or_else(|| ConfigError::InvalidPttKey(cli.ptt_key.clone()))?;

        let mut predicates = Predicates::new(ptt_key);
        predicates.toggle_combo =
            parse_combination("--toggle-combo", cli.toggle_combo.as_deref())?;
        predicates.mute_combo = parse_combination("--mute-combo", cli.mute_combo.as_deref())?;

        let sounds_dir = match cli.sounds_dir {
            Some(dir) => dir,
            None => default_sounds_dir()?,
        };

        Ok(Self {
            predicates,
            sounds_dir,
            sound_cues: !cli.no_sound_cues,
            devices: cli.devices,
            verbose: cli.verbose,
        })
    }
}

/// An absent or empty option means the combination is not configured
fn parse_combination(
    option: &'static str,
    value: Option<&str>,
) -> Result<Option<KeyCombination>, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(spec) => KeyCombination::parse(spec)
            .map(Some)
            .map_err(|source| ConfigError::InvalidCombination { option, source }),
    }
}

fn default_sounds_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::NoSoundsDir)?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("ptt-daemon")
        .join("sounds"))
}
