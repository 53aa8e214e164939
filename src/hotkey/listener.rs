//! Device listening: the backend-agnostic source contract and the tasks
//! that feed normalized key events into the state machine.
//!
//! Each device runs in its own tokio task. All tasks share one channel so
//! the state machine sees a single serialized stream of events.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::keys::{normalize, KeyId, RawKey};

/// Whether a raw event is a press, a release or an auto-repeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

/// Event as delivered by a device backend, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub action: KeyAction,
    pub key: RawKey,
}

/// Normalized events sent from the device tasks to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(KeyId),
    Released(KeyId),
}

/// A keyboard-like input device
///
/// `next_event` yields key events forever; an error ends the stream and the
/// source is not restartable.
pub trait DeviceSource: Send + 'static {
    /// Human readable device name for logs
    fn name(&self) -> &str;

    /// Wait for the next key event
    fn next_event(&mut self) -> impl Future<Output = Result<RawKeyEvent, InputError>> + Send;
}

/// Errors raised by device backends
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to open input device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read from input device {device}: {source}")]
    Read {
        device: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read events from `source`, normalize them and forward them to `event_tx`
///
/// Returns `Ok(())` once the receiving side is gone, or the source's error
/// if reading fails.
pub async fn forward_events<S: DeviceSource>(
    mut source: S,
    event_tx: mpsc::Sender<KeyEvent>,
) -> Result<(), InputError> {
    loop {
        let raw = source.next_event().await?;

        let Some(key) = normalize(&raw.key) else {
            debug!(device = source.name(), key = ?raw.key, "unrecognized key, dropped");
            continue;
        };

        let event = match raw.action {
            KeyAction::Press => KeyEvent::Pressed(key),
            KeyAction::Release => KeyEvent::Released(key),
            KeyAction::Repeat => {
                trace!(device = source.name(), %key, "key repeat ignored");
                continue;
            }
        };

        debug!(device = source.name(), ?event, "key event");

        if event_tx.send(event).await.is_err() {
            debug!(device = source.name(), "event channel closed");
            return Ok(());
        }
    }
}

/// Owns the per-device forwarding tasks
///
/// The listener keeps no sender of its own, so the event channel closes
/// once every device task has ended.
#[derive(Default)]
pub struct DeviceListener {
    tasks: Vec<JoinHandle<()>>,
}

impl DeviceListener {
    /// Create a listener with no devices
    pub fn new() -> Self {
        Self::default()
    }

    /// Start forwarding events from a device on its own task
    pub fn spawn<S: DeviceSource>(&mut self, source: S, event_tx: mpsc::Sender<KeyEvent>) {
        let name = source.name().to_owned();
        info!(device = %name, "listening on device");

        self.tasks.push(tokio::spawn(async move {
            match forward_events(source, event_tx).await {
                Ok(()) => debug!(device = %name, "device listener finished"),
                Err(e) => warn!(device = %name, error = %e, "device listener stopped"),
            }
        }));
    }

    /// Number of devices that were started
    pub fn device_count(&self) -> usize {
        self.tasks.len()
    }

    /// Check whether any device task is still alive
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Abort every device task, dropping the device handles
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!("device listeners stopped");
    }
}
