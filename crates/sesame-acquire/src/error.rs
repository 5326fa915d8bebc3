//! Error types for acquisition.

use sesame_record::{PersistenceError, SessionError};
use thiserror::Error;

/// Camera or trigger hardware failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("{0} is not connected")]
    NotConnected(&'static str),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Trigger read failed: {0}")]
    TriggerRead(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    /// The line already reads asserted before arming; usually the BNC cable
    /// between the trigger device and the TTL source is not connected.
    #[error("Trigger line already asserted (code {code}); connect the trigger device to the TTL source")]
    AlreadyAsserted { code: u8 },

    #[error("Trigger wait cancelled")]
    Cancelled,

    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Devices are held by a running acquisition")]
    DeviceBusy,

    #[error("Acquisition thread did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),

    #[error("Failed to start acquisition thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type AcquireResult<T> = std::result::Result<T, AcquisitionError>;
