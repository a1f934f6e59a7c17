//! Capture trait definitions
//!
//! Platform-agnostic seams for the sensor streams on the wrist device and
//! the capture hardware on the companion. Platform bindings implement these;
//! the core never talks to an OS API directly.

use crate::recorder::channel::Channel;
use crate::recorder::samples::{MotionSample, OrientationSample, PositionSample};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Sensor-side errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Sensor not available: {0}")]
    AdapterUnavailable(Channel),

    #[error("Failed to update {channel}: {message}")]
    Reading { channel: Channel, message: String },
}

/// A single delivery from a sensor stream
pub type SensorReading<T> = Result<T, SensorError>;

/// Callback a sensor stream delivers into. May be invoked from any thread.
pub type SensorCallback<T> = Arc<dyn Fn(SensorReading<T>) + Send + Sync>;

/// Source of position, orientation and motion readings
pub trait SensorAdapter: Send + Sync {
    /// Start location updates
    fn subscribe_position(&self, callback: SensorCallback<PositionSample>) -> Result<(), SensorError>;

    /// Start gyroscope updates at the requested interval
    fn subscribe_orientation(
        &self,
        interval: Duration,
        callback: SensorCallback<OrientationSample>,
    ) -> Result<(), SensorError>;

    /// Start accelerometer updates at the requested interval
    fn subscribe_motion(
        &self,
        interval: Duration,
        callback: SensorCallback<MotionSample>,
    ) -> Result<(), SensorError>;

    /// Stop every stream. Callbacks must not be invoked after this returns.
    fn unsubscribe_all(&self);
}

/// Companion capture hardware errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Capture device not available: {0}")]
    AdapterUnavailable(String),

    #[error("Capture hardware error: {0}")]
    Hardware(String),
}

/// Video (or equivalent) capture session on the companion device
pub trait CaptureHardware: Send + Sync {
    /// Attach the input device and start the session running
    fn prepare(&self) -> Result<(), CaptureError>;

    /// Whether the capture session is running
    fn is_running(&self) -> bool;

    /// Whether a recording output can be attached right now
    fn can_add_output(&self) -> bool;

    /// Begin writing a recording to `output`
    fn start_recording(&self, output: &Path) -> Result<(), CaptureError>;

    /// Finish the current recording, if any
    fn stop_recording(&self);
}
