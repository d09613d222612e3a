//! Soft buttons under the LCD and what they do.
//!
//! Button 0 toggles the track titles; buttons 1 to 3 are previous,
//! play/pause and next. Media keys go through a [`MediaKeySink`] so the
//! OS-specific key injection stays outside this crate.

use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, info};

use crate::model::CapabilityFlags;

bitflags! {
    /// Bitmask of the soft buttons currently pressed.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SoftButtons: u8 {
        const BUTTON0 = 0b0001;
        const BUTTON1 = 0b0010;
        const BUTTON2 = 0b0100;
        const BUTTON3 = 0b1000;
    }
}

impl SoftButtons {
    /// Mask for the button at `index` (0 to 3).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(SoftButtons::BUTTON0),
            1 => Some(SoftButtons::BUTTON1),
            2 => Some(SoftButtons::BUTTON2),
            3 => Some(SoftButtons::BUTTON3),
            _ => None,
        }
    }
}

/// Callback registered with the LCD manager when a device is opened.
pub type SoftButtonHandler = Arc<dyn Fn(SoftButtons) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKey {
    PreviousTrack,
    PlayPause,
    NextTrack,
}

/// Receiver of media key presses, usually the OS input queue.
pub trait MediaKeySink: Send + Sync {
    fn send(&self, key: MediaKey);
}

/// Sink that only traces the key presses.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingMediaKeys;

impl MediaKeySink for LoggingMediaKeys {
    fn send(&self, key: MediaKey) {
        info!(key = ?key, "Media key pressed");
    }
}

/// Translates soft-button events into capability changes and media keys.
#[derive(Clone)]
pub struct SoftButtonDispatcher {
    flags: Arc<CapabilityFlags>,
    keys: Arc<dyn MediaKeySink>,
}

impl SoftButtonDispatcher {
    pub fn new(flags: Arc<CapabilityFlags>, keys: Arc<dyn MediaKeySink>) -> Self {
        SoftButtonDispatcher { flags, keys }
    }

    /// Runs on the device-event thread. A release reports an empty mask.
    pub fn dispatch(&self, buttons: SoftButtons) {
        if buttons.is_empty() {
            return;
        }
        debug!(buttons = ?buttons, "Soft buttons changed");

        if buttons.contains(SoftButtons::BUTTON0) {
            let shown = self.flags.toggle_show_titles();
            info!(show_titles = shown, "Track titles toggled");
        }
        if buttons.contains(SoftButtons::BUTTON1) {
            self.keys.send(MediaKey::PreviousTrack);
        }
        if buttons.contains(SoftButtons::BUTTON2) {
            self.keys.send(MediaKey::PlayPause);
        }
        if buttons.contains(SoftButtons::BUTTON3) {
            self.keys.send(MediaKey::NextTrack);
        }
    }

    pub fn into_handler(self) -> SoftButtonHandler {
        Arc::new(move |buttons| self.dispatch(buttons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingKeys(Mutex<Vec<MediaKey>>);

    impl MediaKeySink for RecordingKeys {
        fn send(&self, key: MediaKey) {
            self.0.lock().unwrap().push(key);
        }
    }

    fn dispatcher() -> (Arc<CapabilityFlags>, Arc<RecordingKeys>, SoftButtonHandler) {
        let flags = Arc::new(CapabilityFlags::new(true));
        let keys = Arc::new(RecordingKeys::default());
        let handler = SoftButtonDispatcher::new(flags.clone(), keys.clone()).into_handler();
        (flags, keys, handler)
    }

    #[test]
    fn test_button0_toggles_titles() {
        let (flags, keys, handler) = dispatcher();
        handler(SoftButtons::BUTTON0);
        assert!(!flags.show_titles());
        handler(SoftButtons::empty());
        assert!(!flags.show_titles());
        handler(SoftButtons::BUTTON0);
        assert!(flags.show_titles());
        assert!(keys.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_media_buttons() {
        let (flags, keys, handler) = dispatcher();
        handler(SoftButtons::BUTTON1);
        handler(SoftButtons::BUTTON2);
        handler(SoftButtons::BUTTON3);
        handler(SoftButtons::BUTTON1 | SoftButtons::BUTTON3);

        assert_eq!(
            *keys.0.lock().unwrap(),
            vec![
                MediaKey::PreviousTrack,
                MediaKey::PlayPause,
                MediaKey::NextTrack,
                MediaKey::PreviousTrack,
                MediaKey::NextTrack,
            ]
        );
        assert!(flags.show_titles());
    }

    #[test]
    fn test_from_index() {
        assert_eq!(SoftButtons::from_index(2), Some(SoftButtons::BUTTON2));
        assert_eq!(SoftButtons::from_index(4), None);
    }
}
