//! # pmolcd
//!
//! Now-playing applet for small LCD panels: polls a player status source,
//! composes a page and keeps it drawn on the display across hot-plugs.
//!
//! The crate does not talk to any hardware itself. An LCD manager
//! implementing [`LcdManager`] opens displays, a [`StatusSource`] provides
//! player state, and [`Applet`] ties them together on a fixed tick.

pub mod applet;
pub mod arrival;
pub mod device;
pub mod errors;
pub mod model;
pub mod render;
pub mod status;

pub use applet::{Applet, AppletControl, DEFAULT_TICK_PERIOD};
pub use arrival::{ArrivalBridge, LcdDeviceType};
pub use device::{
    DeviceConnectionState, DeviceHandle, LcdDevice, LcdManager, LoggingMediaKeys, MediaKey,
    MediaKeySink, SoftButtonDispatcher, SoftButtonHandler, SoftButtons,
};
pub use errors::{AppletError, DeviceError, SourceError};
pub use model::{CapabilityFlags, DisplayCapabilities, PlayerSnapshot, TrackInfo};
pub use render::{DrawOp, Glyph, RenderPage, RenderSurface, ScrollState};
pub use status::StatusSource;
