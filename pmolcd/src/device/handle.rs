//! Lifecycle of the one display the applet draws on.
//!
//! ```text
//! Absent    --arrival-->      Arrived
//! Arrived   --open ok-->      Open
//! Arrived   --open fails-->   Absent
//! Open      --disposed-->     Disposed
//! Open      --arrival-->      Reopening
//! Reopening --reopen ok-->    Open
//! Reopening --reopen fails--> Disposed
//! Disposed  --arrival-->      Arrived   (fresh device, old one dropped)
//! ```
//!
//! Drawing only reaches the device from `Open`.

use tracing::{debug, info, warn};

use crate::arrival::LcdDeviceType;
use crate::device::{LcdDevice, LcdManager, SoftButtonHandler};
use crate::errors::DeviceError;
use crate::render::RenderPage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceConnectionState {
    Absent,
    Arrived,
    Open,
    Reopening,
    Disposed,
}

pub struct DeviceHandle<D> {
    device_type: LcdDeviceType,
    state: DeviceConnectionState,
    device: Option<D>,
}

impl<D: LcdDevice> DeviceHandle<D> {
    pub fn new(device_type: LcdDeviceType) -> Self {
        DeviceHandle {
            device_type,
            state: DeviceConnectionState::Absent,
            device: None,
        }
    }

    pub fn device_type(&self) -> LcdDeviceType {
        self.device_type
    }

    pub fn state(&self) -> DeviceConnectionState {
        self.state
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.state == DeviceConnectionState::Disposed
            || self.device.as_ref().is_some_and(|d| d.is_disposed())
    }

    /// Moves `Open` to `Disposed` if the device reports it was released.
    pub fn refresh(&mut self) -> DeviceConnectionState {
        if self.state == DeviceConnectionState::Open
            && self.device.as_ref().is_some_and(|d| d.is_disposed())
        {
            info!(device_type = ?self.device_type, "Device disposed");
            self.state = DeviceConnectionState::Disposed;
        }
        self.state
    }

    /// Services an arrival signal: reopens a live device, opens a fresh one
    /// otherwise.
    ///
    /// The new state is already recorded when an error is returned. A
    /// failed open leaves the handle `Absent`, a failed reopen `Disposed`;
    /// both are retried on the next arrival.
    pub fn on_arrival<M>(
        &mut self,
        manager: &M,
        on_soft_buttons: &SoftButtonHandler,
    ) -> Result<DeviceConnectionState, DeviceError>
    where
        M: LcdManager<Device = D>,
    {
        self.refresh();

        if let (DeviceConnectionState::Open, Some(device)) = (self.state, self.device.as_mut()) {
            self.state = DeviceConnectionState::Reopening;
            debug!(device_type = ?self.device_type, "Reopening device");
            return match device.reopen() {
                Ok(()) => {
                    self.state = DeviceConnectionState::Open;
                    Ok(self.state)
                }
                Err(err) => {
                    warn!(device_type = ?self.device_type, error = %err, "Reopen failed");
                    self.state = DeviceConnectionState::Disposed;
                    Err(err)
                }
            };
        }

        if self.device.take().is_some() {
            debug!(device_type = ?self.device_type, "Dropping disposed device");
        }
        self.state = DeviceConnectionState::Arrived;

        match manager.open_device_by_type(self.device_type, on_soft_buttons.clone()) {
            Ok(mut device) => {
                if let Err(err) = device.set_as_foreground(true) {
                    warn!(device_type = ?self.device_type, error = %err, "Cannot bring applet to foreground");
                }
                info!(device_type = ?self.device_type, "Device opened");
                self.device = Some(device);
                self.state = DeviceConnectionState::Open;
                Ok(self.state)
            }
            Err(err) => {
                warn!(device_type = ?self.device_type, error = %err, "Open failed");
                self.state = DeviceConnectionState::Absent;
                Err(err)
            }
        }
    }

    /// Draws `page` if the device is open.
    ///
    /// Fails fast with [`DeviceError::NotOpen`] in any other state, and with
    /// [`DeviceError::DisposedMidFrame`] when disposal is noticed now.
    pub fn draw(&mut self, page: &RenderPage) -> Result<(), DeviceError> {
        let was_open = self.state == DeviceConnectionState::Open;

        match (self.refresh(), self.device.as_mut()) {
            (DeviceConnectionState::Open, Some(device)) => match device.update_and_draw(page) {
                Ok(()) => Ok(()),
                Err(_) if device.is_disposed() => {
                    self.state = DeviceConnectionState::Disposed;
                    Err(DeviceError::DisposedMidFrame)
                }
                Err(DeviceError::DisposedMidFrame) => {
                    self.state = DeviceConnectionState::Disposed;
                    Err(DeviceError::DisposedMidFrame)
                }
                Err(err) => Err(err),
            },
            (DeviceConnectionState::Disposed, _) if was_open => Err(DeviceError::DisposedMidFrame),
            _ => Err(DeviceError::NotOpen),
        }
    }
}
