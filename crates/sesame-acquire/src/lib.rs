//! Flying Sesame Acquire - camera acquisition and recording control
//!
//! The acquisition loop snaps frames at a paced rate, runs the pose estimator
//! and circle fit, publishes each frame to the presenter and, while
//! recording, hands it to the ordered persistence worker. Triggered
//! recordings first wait for a debounced TTL trigger.

pub mod control;
pub mod controller;
pub mod delivery;
pub mod device;
pub mod error;
pub mod fps;
pub mod machine;
pub mod pacing;
pub mod sim;
pub mod trigger;

pub use control::AcquisitionControl;
pub use controller::AcquisitionController;
pub use delivery::{channels, AcquisitionChannels, FrameSender, PresenterChannels, StatusEvent};
pub use device::{Camera, DeviceReport, DeviceStatus, TriggerDevice};
pub use error::{AcquireResult, AcquisitionError, DeviceError, TriggerError};
pub use fps::FpsWindow;
pub use machine::{
    Acquisition, AcquisitionMode, AcquisitionState, RatePlan, SessionOutcome, WriterFactory,
};
pub use pacing::{pacing_delay, wait_to_pace};
pub use trigger::TriggerSynchronizer;
