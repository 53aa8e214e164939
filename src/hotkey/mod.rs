//! Global keyboard capture
//!
//! Raw key events come from a [`DeviceSource`] (evdev on Linux), are
//! normalized to [`KeyId`]s and forwarded over a channel to the PTT state
//! machine.

#[cfg(target_os = "linux")]
pub mod linux;
mod keys;
mod listener;

pub use keys::{HeldKeys, KeyCombination, KeyId, KeyParseError, RawKey};
pub use listener::{DeviceListener, DeviceSource, InputError, KeyAction, KeyEvent, RawKeyEvent};
