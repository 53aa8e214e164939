//! Daemon lifecycle: startup, signals and the shutdown sequence

mod shutdown;

pub use shutdown::ShutdownSignal;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::audio::{AudioControl, CuePlayer, IntentDispatcher};
use crate::events::Intent;
use crate::hotkey::{DeviceListener, DeviceSource, KeyEvent};
use crate::state::StateMachine;

/// Capacity of the channel between device tasks and the state machine
const EVENT_CHANNEL_SIZE: usize = 64;

/// Errors that keep the daemon from starting
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("no usable keyboard devices, check read access to /dev/input")]
    NoDevices,
}

/// Mute the mic and start one listener task per keyboard
///
/// Returns the listener owning the tasks and the receiving end of their
/// shared event channel. Nothing is dispatched when there are no keyboards.
pub async fn startup_sequence<S, A, P>(
    keyboards: Vec<S>,
    dispatcher: &IntentDispatcher<A, P>,
) -> Result<(DeviceListener, mpsc::Receiver<KeyEvent>), StartupError>
where
    S: DeviceSource,
    A: AudioControl,
    P: CuePlayer,
{
    if keyboards.is_empty() {
        error!("no keyboard devices found");
        return Err(StartupError::NoDevices);
    }

    // Start from a muted mic
    dispatcher.dispatch(Intent::DisableMic).await;

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let mut listener = DeviceListener::new();
    for keyboard in keyboards {
        listener.spawn(keyboard, event_tx.clone());
    }

    Ok((listener, event_rx))
}

/// Release every device and leave the mic muted
///
/// Runs whatever ended the main loop: a signal, or all devices going away.
pub async fn shutdown_sequence<A, P>(
    listener: &mut DeviceListener,
    state_machine: &mut StateMachine,
    dispatcher: &IntentDispatcher<A, P>,
) where
    A: AudioControl,
    P: CuePlayer,
{
    info!("stopping listener...");
    listener.stop();
    dispatcher.dispatch_all(state_machine.shutdown()).await;
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::audio::recording_dispatcher;
    use crate::hotkey::{InputError, KeyAction, KeyId, RawKey, RawKeyEvent};
    use crate::state::Predicates;

    /// Presses one key, then fails like an unplugged device
    struct OneKeySource {
        key: Option<RawKey>,
    }

    impl OneKeySource {
        fn new(name: &str) -> Self {
            Self {
                key: Some(RawKey::Named(name.to_string())),
            }
        }
    }

    impl DeviceSource for OneKeySource {
        fn name(&self) -> &str {
            "one key"
        }

        async fn next_event(&mut self) -> Result<RawKeyEvent, InputError> {
            match self.key.take() {
                Some(key) => Ok(RawKeyEvent {
                    action: KeyAction::Press,
                    key,
                }),
                None => Err(InputError::Read {
                    device: "one key".to_string(),
                    source: io::ErrorKind::UnexpectedEof.into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_startup_without_devices_fails() {
        let (dispatcher, calls) = recording_dispatcher(true);

        let result = startup_sequence(Vec::<OneKeySource>::new(), &dispatcher).await;

        assert!(matches!(result, Err(StartupError::NoDevices)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_startup_mutes_mic_before_events() {
        let (dispatcher, calls) = recording_dispatcher(false);
        let keyboards = vec![OneKeySource::new("KEY_RIGHTCTRL")];

        let (mut listener, event_rx) = startup_sequence(keyboards, &dispatcher).await.unwrap();
        assert_eq!(listener.device_count(), 1);
        assert_eq!(*calls.lock().unwrap(), vec![Intent::DisableMic]);

        let ptt_key = KeyId::from_name("rightctrl").unwrap();
        let mut state_machine = StateMachine::new(Predicates::new(ptt_key));
        state_machine.run(event_rx, &dispatcher).await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec![Intent::DisableMic, Intent::EnableMic]
        );
        listener.stop();
    }

    #[tokio::test]
    async fn test_shutdown_mutes_mic_in_any_mode() {
        let ptt_key = KeyId::from_name("rightctrl").unwrap();
        let mut state_machine = StateMachine::new(Predicates::new(ptt_key.clone()));
        state_machine.on_press(ptt_key);

        let (dispatcher, calls) = recording_dispatcher(true);
        let mut listener = DeviceListener::new();

        shutdown_sequence(&mut listener, &mut state_machine, &dispatcher).await;

        assert_eq!(*calls.lock().unwrap(), vec![Intent::DisableMic]);
        assert!(state_machine.held().is_empty());
        assert!(!listener.is_running());
    }
}
