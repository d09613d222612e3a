use thiserror::Error;

use crate::arrival::LcdDeviceType;

/// Failure reported by a [`StatusSource`](crate::status::StatusSource).
///
/// A player with no track loaded is not an error: it is a snapshot with an
/// absent track.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Status source unavailable ({code}): {message}")]
    Unavailable { code: String, message: String },
}

impl SourceError {
    pub fn unavailable(code: &str, message: impl Into<String>) -> Self {
        SourceError::Unavailable {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Cannot open {0:?} device: {1}")]
    OpenFailed(LcdDeviceType, String),
    #[error("No open device to draw on")]
    NotOpen,
    #[error("Device was disposed while drawing")]
    DisposedMidFrame,
    #[error("Device I/O error: {0}")]
    Io(String),
}

impl DeviceError {
    pub fn open_failed(device_type: LcdDeviceType, message: impl Into<String>) -> Self {
        DeviceError::OpenFailed(device_type, message.into())
    }

    /// True for failures the loop absorbs within the tick.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DeviceError::Io(_))
    }
}

#[derive(Error, Debug)]
pub enum AppletError {
    #[error("Startup failed: {0}")]
    FatalStartupFailure(String),
    #[error("Unhandled failure during tick {tick}: {source}")]
    UnhandledTickFailure {
        tick: u64,
        #[source]
        source: DeviceError,
    },
}
