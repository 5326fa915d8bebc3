//! Hardware seams: the camera SDK and the digital-input trigger device.

use crate::error::DeviceError;
use sesame_core::FrameDescription;
use std::fmt;
use std::time::Duration;

/// A triggerable camera.
///
/// `snap` blocks for at most `timeout`; `false` means no frame this time and
/// is not an error. Frames come back as raw driver bytes (BGR or BGRA).
pub trait Camera: Send {
    fn start(&mut self) -> Result<(), DeviceError>;

    fn snap(&mut self, timeout: Duration) -> bool;

    fn frame_description(&self) -> FrameDescription;

    /// Bytes of the most recently snapped frame.
    fn get_frame(&mut self) -> Result<Vec<u8>, DeviceError>;

    fn is_valid(&self) -> bool;
}

/// A digital-input device polled for the TTL trigger.
pub trait TriggerDevice: Send {
    /// One code per port, starting at `start_port`.
    fn read(&mut self, start_port: u8, port_count: u8) -> Result<Vec<u8>, DeviceError>;

    fn is_valid(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Connected,
    Disconnected,
}

impl DeviceStatus {
    pub fn from_valid(valid: bool) -> Self {
        if valid {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Connectivity of both devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceReport {
    pub camera: DeviceStatus,
    pub trigger: DeviceStatus,
}
