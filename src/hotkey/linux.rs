//! Linux keyboard backend built on evdev
//!
//! Reads key events straight from `/dev/input/event*`, which works the same
//! under X11, Wayland and a bare console. The user needs read access to the
//! device nodes (usually membership in the `input` group).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use evdev::{Device, EventStream, EventType, InputEventKind, Key};
use tracing::{debug, info, trace, warn};

use super::keys::normalize;
use super::{DeviceSource, InputError, KeyAction, KeyId, RawKey, RawKeyEvent};

/// An open evdev device streaming its events asynchronously
pub struct EvdevSource {
    name: String,
    stream: EventStream,
}

impl EvdevSource {
    /// Open the device node at `path`
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let device = Device::open(path).map_err(|source| InputError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_device(path, device)
    }

    fn from_device(path: &Path, device: Device) -> Result<Self, InputError> {
        let name = format!(
            "{} ({})",
            device.name().unwrap_or("unknown"),
            path.display()
        );
        let stream = device.into_event_stream().map_err(|source| InputError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { name, stream })
    }
}

impl DeviceSource for EvdevSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_event(&mut self) -> Result<RawKeyEvent, InputError> {
        loop {
            let event = self
                .stream
                .next_event()
                .await
                .map_err(|source| InputError::Read {
                    device: self.name.clone(),
                    source,
                })?;

            let InputEventKind::Key(key) = event.kind() else {
                continue;
            };

            let action = match event.value() {
                0 => KeyAction::Release,
                1 => KeyAction::Press,
                2 => KeyAction::Repeat,
                other => {
                    trace!(device = %self.name, value = other, "unexpected key event value");
                    continue;
                }
            };

            return Ok(RawKeyEvent {
                action,
                key: raw_key(key),
            });
        }
    }
}

/// Map an evdev key to its table name, e.g. `KEY_LEFTCTRL`
fn raw_key(key: Key) -> RawKey {
    let name = format!("{key:?}");
    if name.starts_with("KEY_") || name.starts_with("BTN_") {
        RawKey::Named(name)
    } else {
        RawKey::Unknown(key.code())
    }
}

/// Check whether some evdev key code normalizes to `key`
///
/// Names such as `control_r` pass validation as key names but no device
/// ever reports them, so a binding on them can never fire.
pub fn is_reachable_key(key: &KeyId) -> bool {
    let upper = key.as_str().to_uppercase();
    let table_name = if upper.starts_with("BTN_") {
        upper
    } else {
        format!("KEY_{upper}")
    };

    // Alias constants share a code with an earlier name and never come back
    // under their own
    Key::from_str(&table_name)
        .is_ok_and(|code| normalize(&raw_key(code)).as_ref() == Some(key))
}

/// Keys from `keys` that no evdev code can produce
pub fn unreachable_keys<'a>(keys: impl IntoIterator<Item = &'a KeyId>) -> Vec<&'a KeyId> {
    let mut unreachable: Vec<&KeyId> = Vec::new();
    for key in keys {
        if !is_reachable_key(key) && !unreachable.contains(&key) {
            unreachable.push(key);
        }
    }
    unreachable
}

/// Open the keyboards to listen on
///
/// With explicit `paths`, exactly those nodes are opened. Otherwise every
/// input device that reports key events is used. Devices that cannot be
/// opened are logged and skipped.
pub fn discover_keyboards(paths: &[PathBuf]) -> Vec<EvdevSource> {
    if !paths.is_empty() {
        return paths
            .iter()
            .filter_map(|path| match EvdevSource::open(path) {
                Ok(source) => Some(source),
                Err(e) => {
                    warn!(error = %e, "skipping input device");
                    None
                }
            })
            .collect();
    }

    let mut sources = Vec::new();
    for (path, device) in evdev::enumerate() {
        if !device.supported_events().contains(EventType::KEY) {
            trace!(path = %path.display(), "no key events, skipped");
            continue;
        }

        match EvdevSource::from_device(&path, device) {
            Ok(source) => {
                info!(device = %source.name, "found keyboard device");
                sources.push(source);
            }
            Err(e) => debug!(error = %e, "cannot stream input device"),
        }
    }
    sources
}
