//! Recording state management
//!
//! Defines the recording state machine and session tracking.

use super::buffer::{SampleBuffer, DEFAULT_MAX_PENDING_TICKS};
use super::samples::{MotionSample, OrientationSample, PositionSample};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Current state of the local recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    #[default]
    Idle,
    /// Sensors subscribed, buffer accepting readings
    Recording,
    /// Sensors halted, buffer holds the recording
    Stopped,
    /// Buffer handed to the export pipeline
    Exported,
}

/// Buffer together with the gate that decides whether readings land in it.
///
/// Both live behind one lock so that closing the gate and the last
/// accepted reading cannot interleave.
#[derive(Debug)]
pub struct SessionBuffer {
    accepting: bool,
    buffer: SampleBuffer,
}

impl SessionBuffer {
    pub fn new(max_pending: usize) -> Self {
        Self {
            accepting: false,
            buffer: SampleBuffer::with_max_pending(max_pending),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub(crate) fn open(&mut self) {
        self.accepting = true;
    }

    /// Stop accepting readings and drop incomplete ticks
    pub(crate) fn close(&mut self) -> usize {
        self.accepting = false;
        self.buffer.discard_pending()
    }

    pub fn accept_position(&mut self, sample: PositionSample) -> bool {
        self.accepting && self.buffer.submit_position(sample.tick(), sample)
    }

    pub fn accept_orientation(&mut self, sample: OrientationSample) -> bool {
        self.accepting && self.buffer.submit_orientation(sample.tick(), sample)
    }

    pub fn accept_motion(&mut self, sample: MotionSample) -> bool {
        self.accepting && self.buffer.submit_motion(sample.tick(), sample)
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
}

/// Handle to a session buffer shared with sensor callbacks
pub type SharedBuffer = Arc<Mutex<SessionBuffer>>;

/// One device's recording session
///
/// Owned by the [`RecordingController`](super::RecordingController); sensor
/// callbacks only ever see the [`SharedBuffer`].
#[derive(Debug)]
pub struct RecordingSession {
    pub(crate) id: Uuid,
    pub(crate) state: RecordingState,
    /// Advances only while recording
    pub(crate) elapsed_seconds: f64,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) stopped_at: Option<DateTime<Utc>>,
    pub(crate) buffer: SharedBuffer,
}

impl RecordingSession {
    pub fn new(max_pending: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RecordingState::Idle,
            elapsed_seconds: 0.0,
            started_at: None,
            stopped_at: None,
            buffer: Arc::new(Mutex::new(SessionBuffer::new(max_pending))),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn buffer(&self) -> SharedBuffer {
        self.buffer.clone()
    }

    pub fn record_count(&self) -> usize {
        self.buffer.lock().buffer().len()
    }

    /// Reset to a fresh idle session with a new id
    pub(crate) fn reset(&mut self) {
        self.id = Uuid::new_v4();
        self.state = RecordingState::Idle;
        self.elapsed_seconds = 0.0;
        self.started_at = None;
        self.stopped_at = None;
        let mut buffer = self.buffer.lock();
        buffer.close();
        buffer.buffer_mut().drain();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let buffer = self.buffer.lock();
        SessionSnapshot {
            id: self.id,
            state: self.state,
            elapsed_seconds: self.elapsed_seconds,
            record_count: buffer.buffer().len(),
            pending_ticks: buffer.buffer().pending_ticks(),
            started_at: self.started_at,
            stopped_at: self.stopped_at,
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING_TICKS)
    }
}

/// Point-in-time view of a session for observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub state: RecordingState,
    pub elapsed_seconds: f64,
    pub record_count: usize,
    pub pending_ticks: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Configuration for the wrist-side recorder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingConfig {
    /// Period of the elapsed-time ticker
    pub tick_interval_secs: f64,

    /// Requested gyroscope update interval
    pub orientation_interval_secs: f64,

    /// Requested accelerometer update interval
    pub motion_interval_secs: f64,

    /// Incomplete ticks held before the oldest is dropped
    pub max_pending_ticks: usize,
}

impl RecordingConfig {
    pub fn tick_interval(&self) -> Duration {
        secs_or(self.tick_interval_secs, 0.1)
    }

    pub fn orientation_interval(&self) -> Duration {
        secs_or(self.orientation_interval_secs, 1.0 / 60.0)
    }

    pub fn motion_interval(&self) -> Duration {
        secs_or(self.motion_interval_secs, 1.0 / 60.0)
    }
}

fn secs_or(secs: f64, fallback: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::from_secs_f64(fallback)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 0.1,
            orientation_interval_secs: 1.0 / 60.0,
            motion_interval_secs: 1.0 / 60.0,
            max_pending_ticks: DEFAULT_MAX_PENDING_TICKS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::samples::Vector3;

    #[test]
    fn test_closed_buffer_rejects_readings() {
        let mut buffer = SessionBuffer::new(16);
        assert!(!buffer.is_accepting());

        buffer.accept_position(PositionSample::new(1.0, 0.0, 0.0));
        buffer.accept_orientation(OrientationSample::new(1.0, Vector3::default()));
        assert!(!buffer.accept_motion(MotionSample::new(1.0, Vector3::default())));
        assert!(buffer.buffer().is_empty());
        assert_eq!(buffer.buffer().pending_ticks(), 0);
    }

    #[test]
    fn test_close_drops_partial_ticks() {
        let mut buffer = SessionBuffer::new(16);
        buffer.open();
        buffer.accept_position(PositionSample::new(1.0, 0.0, 0.0));
        assert_eq!(buffer.close(), 1);
        assert!(!buffer.is_accepting());
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: RecordingConfig = serde_json::from_str(r#"{"tickIntervalSecs": 0.5}"#).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.max_pending_ticks, DEFAULT_MAX_PENDING_TICKS);
    }

    #[test]
    fn test_invalid_interval_falls_back() {
        let config = RecordingConfig {
            motion_interval_secs: -1.0,
            ..Default::default()
        };
        assert_eq!(config.motion_interval(), Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn test_session_reset_assigns_new_id() {
        let mut session = RecordingSession::default();
        let first = session.id();
        session.elapsed_seconds = 3.0;
        session.state = RecordingState::Stopped;
        session.reset();

        assert_ne!(session.id(), first);
        assert_eq!(session.state(), RecordingState::Idle);
        assert_eq!(session.elapsed_seconds(), 0.0);
    }
}
