//! Scripted in-memory capture sources
//!
//! Used by tests and the simulator binary in place of platform bindings.
//! Readings are pushed in by the caller and forwarded to whatever callback
//! is currently subscribed.

use super::traits::{
    CaptureError, CaptureHardware, SensorAdapter, SensorCallback, SensorError, SensorReading,
};
use crate::recorder::channel::Channel;
use crate::recorder::samples::{MotionSample, OrientationSample, PositionSample};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Scripted sensor adapter
#[derive(Clone, Default)]
pub struct ScriptedSensors {
    inner: Arc<Mutex<ScriptedSensorsInner>>,
}

#[derive(Default)]
struct ScriptedSensorsInner {
    unavailable: Vec<Channel>,
    position: Option<SensorCallback<PositionSample>>,
    orientation: Option<SensorCallback<OrientationSample>>,
    motion: Option<SensorCallback<MotionSample>>,
    orientation_interval: Option<Duration>,
    motion_interval: Option<Duration>,
    unsubscribe_count: usize,
}

impl ScriptedSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subscriptions to `channel` fail as if the sensor were missing
    pub fn set_unavailable(&self, channel: Channel) {
        let mut inner = self.inner.lock();
        if !inner.unavailable.contains(&channel) {
            inner.unavailable.push(channel);
        }
    }

    pub fn is_subscribed(&self, channel: Channel) -> bool {
        let inner = self.inner.lock();
        match channel {
            Channel::Position => inner.position.is_some(),
            Channel::Orientation => inner.orientation.is_some(),
            Channel::Motion => inner.motion.is_some(),
        }
    }

    /// Interval requested by the last gyroscope and accelerometer subscriptions
    pub fn requested_intervals(&self) -> (Option<Duration>, Option<Duration>) {
        let inner = self.inner.lock();
        (inner.orientation_interval, inner.motion_interval)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.inner.lock().unsubscribe_count
    }

    // The callback is cloned out so it runs without the adapter lock held.

    /// Deliver a position reading. Returns false when nobody is subscribed.
    pub fn emit_position(&self, reading: SensorReading<PositionSample>) -> bool {
        let callback = self.inner.lock().position.clone();
        callback.map(|cb| cb(reading)).is_some()
    }

    /// Deliver a gyroscope reading. Returns false when nobody is subscribed.
    pub fn emit_orientation(&self, reading: SensorReading<OrientationSample>) -> bool {
        let callback = self.inner.lock().orientation.clone();
        callback.map(|cb| cb(reading)).is_some()
    }

    /// Deliver an accelerometer reading. Returns false when nobody is subscribed.
    pub fn emit_motion(&self, reading: SensorReading<MotionSample>) -> bool {
        let callback = self.inner.lock().motion.clone();
        callback.map(|cb| cb(reading)).is_some()
    }

    fn check(&self, channel: Channel) -> Result<(), SensorError> {
        if self.inner.lock().unavailable.contains(&channel) {
            Err(SensorError::AdapterUnavailable(channel))
        } else {
            Ok(())
        }
    }
}

impl SensorAdapter for ScriptedSensors {
    fn subscribe_position(&self, callback: SensorCallback<PositionSample>) -> Result<(), SensorError> {
        self.check(Channel::Position)?;
        self.inner.lock().position = Some(callback);
        Ok(())
    }

    fn subscribe_orientation(
        &self,
        interval: Duration,
        callback: SensorCallback<OrientationSample>,
    ) -> Result<(), SensorError> {
        self.check(Channel::Orientation)?;
        let mut inner = self.inner.lock();
        inner.orientation = Some(callback);
        inner.orientation_interval = Some(interval);
        Ok(())
    }

    fn subscribe_motion(
        &self,
        interval: Duration,
        callback: SensorCallback<MotionSample>,
    ) -> Result<(), SensorError> {
        self.check(Channel::Motion)?;
        let mut inner = self.inner.lock();
        inner.motion = Some(callback);
        inner.motion_interval = Some(interval);
        Ok(())
    }

    fn unsubscribe_all(&self) {
        let mut inner = self.inner.lock();
        inner.position = None;
        inner.orientation = None;
        inner.motion = None;
        inner.unsubscribe_count += 1;
    }
}

/// Scripted companion camera
#[derive(Clone)]
pub struct ScriptedCamera {
    inner: Arc<Mutex<ScriptedCameraInner>>,
}

struct ScriptedCameraInner {
    has_device: bool,
    accepts_output: bool,
    running: bool,
    active: Option<PathBuf>,
    finished: Vec<PathBuf>,
    write_files: bool,
}

impl ScriptedCamera {
    /// A camera with a device present that is not yet running
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptedCameraInner {
                has_device: true,
                accepts_output: true,
                running: false,
                active: None,
                finished: Vec::new(),
                write_files: false,
            })),
        }
    }

    /// A camera with no input device
    pub fn without_device() -> Self {
        let camera = Self::new();
        camera.inner.lock().has_device = false;
        camera
    }

    pub fn set_accepts_output(&self, accepts: bool) {
        self.inner.lock().accepts_output = accepts;
    }

    /// Create an empty file at the output path when a recording starts
    pub fn write_files(&self, enabled: bool) {
        self.inner.lock().write_files = enabled;
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    /// Output paths of completed recordings
    pub fn finished_recordings(&self) -> Vec<PathBuf> {
        self.inner.lock().finished.clone()
    }
}

impl Default for ScriptedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureHardware for ScriptedCamera {
    fn prepare(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if !inner.has_device {
            return Err(CaptureError::AdapterUnavailable("back camera".to_string()));
        }
        inner.running = true;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    fn can_add_output(&self) -> bool {
        let inner = self.inner.lock();
        inner.accepts_output && inner.active.is_none()
    }

    fn start_recording(&self, output: &Path) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if !inner.running {
            return Err(CaptureError::Hardware("session not running".to_string()));
        }
        if inner.write_files {
            std::fs::write(output, b"").map_err(|e| CaptureError::Hardware(e.to_string()))?;
        }
        inner.active = Some(output.to_path_buf());
        Ok(())
    }

    fn stop_recording(&self) {
        let mut inner = self.inner.lock();
        if let Some(path) = inner.active.take() {
            inner.finished.push(path);
        }
    }
}
