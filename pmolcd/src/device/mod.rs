//! LCD device boundary.
//!
//! The LCD manager (vendor SDK, emulator, test double) implements
//! [`LcdManager`] and [`LcdDevice`]; the applet only drives them through a
//! [`DeviceHandle`].

pub mod buttons;
pub mod handle;

pub use buttons::{
    LoggingMediaKeys, MediaKey, MediaKeySink, SoftButtonDispatcher, SoftButtonHandler,
    SoftButtons,
};
pub use handle::{DeviceConnectionState, DeviceHandle};

use crate::arrival::LcdDeviceType;
use crate::errors::DeviceError;
use crate::render::RenderPage;

/// An opened display, owned by the main loop thread.
pub trait LcdDevice {
    /// Re-attaches to the display after a connection blip. Subscriptions
    /// made at open time are kept.
    fn reopen(&mut self) -> Result<(), DeviceError>;

    /// True once the manager has released the display behind this handle.
    fn is_disposed(&self) -> bool;

    fn set_as_foreground(&mut self, foreground: bool) -> Result<(), DeviceError>;

    /// Draws `page` and flips the display buffer.
    fn update_and_draw(&mut self, page: &RenderPage) -> Result<(), DeviceError>;
}

/// Opens displays announced through the [`ArrivalBridge`](crate::arrival::ArrivalBridge).
pub trait LcdManager {
    type Device: LcdDevice;

    fn open_device_by_type(
        &self,
        device_type: LcdDeviceType,
        on_soft_buttons: SoftButtonHandler,
    ) -> Result<Self::Device, DeviceError>;
}
