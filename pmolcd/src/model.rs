//! Player state and display capability model shared by the applet threads.

use std::sync::atomic::{AtomicBool, Ordering};

/// Names of the track currently loaded in the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub album: String,
    pub artist: String,
}

/// One fetch's worth of player state.
///
/// `track` is `None` when the player has nothing loaded (startup, adverts).
/// A snapshot is never mutated once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub track: Option<TrackInfo>,
    pub elapsed_seconds: u32,
    pub total_seconds: u32,
    pub is_playing: bool,
    pub is_online: bool,
    pub is_private_session: bool,
}

impl PlayerSnapshot {
    /// Snapshot drawn when the source cannot be queried.
    pub fn idle() -> Self {
        PlayerSnapshot {
            track: None,
            elapsed_seconds: 0,
            total_seconds: 0,
            is_playing: false,
            is_online: false,
            is_private_session: false,
        }
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    pub fn track_title(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.title.as_str())
    }

    pub fn album_title(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.album.as_str())
    }

    pub fn artist_title(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.artist.as_str())
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Plain copy of [`CapabilityFlags`] taken once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayCapabilities {
    pub applet_enabled: bool,
    pub show_titles: bool,
}

impl Default for DisplayCapabilities {
    fn default() -> Self {
        DisplayCapabilities {
            applet_enabled: true,
            show_titles: true,
        }
    }
}

/// Capability flags toggled from the device-event and UI threads.
///
/// Each field has a single writer: `applet_enabled` is written by the LCD
/// manager callbacks, `show_titles` by the soft-button handler. The main loop
/// only reads them.
#[derive(Debug)]
pub struct CapabilityFlags {
    applet_enabled: AtomicBool,
    show_titles: AtomicBool,
}

impl CapabilityFlags {
    pub fn new(show_titles: bool) -> Self {
        CapabilityFlags {
            applet_enabled: AtomicBool::new(true),
            show_titles: AtomicBool::new(show_titles),
        }
    }

    pub fn load(&self) -> DisplayCapabilities {
        DisplayCapabilities {
            applet_enabled: self.applet_enabled(),
            show_titles: self.show_titles(),
        }
    }

    pub fn applet_enabled(&self) -> bool {
        self.applet_enabled.load(Ordering::SeqCst)
    }

    pub fn set_applet_enabled(&self, enabled: bool) {
        self.applet_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn show_titles(&self) -> bool {
        self.show_titles.load(Ordering::SeqCst)
    }

    pub fn set_show_titles(&self, show: bool) {
        self.show_titles.store(show, Ordering::SeqCst);
    }

    /// Flips `show_titles` and returns the new value.
    pub fn toggle_show_titles(&self) -> bool {
        !self.show_titles.fetch_xor(true, Ordering::SeqCst)
    }
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self::new(true)
    }
}
