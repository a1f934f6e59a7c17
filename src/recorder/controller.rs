//! Recording controller
//!
//! Drives the wrist device's recording lifecycle: subscribes the sensor
//! streams into the session buffer, tells the peer when recording starts
//! and stops, and hands the finished buffer to the export pipeline.
//!
//! ```text
//! Idle --start--> Recording --stop--> Stopped --clear--> Idle
//!                                        |
//!                                        +--export--> Exported --start--> Recording
//! ```

use super::channel::{Channel, RecordingError, RecordingResult};
use super::samples::CompositeRecord;
use super::state::{
    RecordingConfig, RecordingSession, RecordingState, SessionBuffer, SessionSnapshot, SharedBuffer,
};
use crate::capture::{SensorAdapter, SensorCallback, SensorReading};
use crate::export::{ExportPipeline, TransferArtifact};
use crate::link::ControlIntent;
use crate::peer::PeerCoordinator;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

/// Events emitted during recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    /// Recording started
    Started,
    /// Recording stopped
    Stopped,
    /// Session cleared back to idle
    Cleared,
    /// Buffer exported
    Exported { record_count: usize },
    /// Elapsed recording time in seconds
    Progress(f64),
}

/// What [`RecordingController::stop_or_clear`] ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    Cleared,
    /// Nothing recorded yet and nothing to clear
    Ignored,
}

/// Result of a completed export
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub session_id: Uuid,
    pub record_count: usize,
    /// Recorded time in seconds
    pub duration_seconds: f64,
    pub artifacts: Vec<TransferArtifact>,
    /// Whether the artifacts were handed to the link
    pub transferred: bool,
}

/// Manages the local recording session
pub struct RecordingController {
    config: RecordingConfig,
    session: RecordingSession,
    sensors: Arc<dyn SensorAdapter>,
    peer: PeerCoordinator,
    pipeline: ExportPipeline,
    event_tx: broadcast::Sender<RecordingEvent>,
}

impl RecordingController {
    /// Create a new recording controller
    pub fn new(
        config: RecordingConfig,
        sensors: Arc<dyn SensorAdapter>,
        peer: PeerCoordinator,
        pipeline: ExportPipeline,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let session = RecordingSession::new(config.max_pending_ticks);
        Self {
            config,
            session,
            sensors,
            peer,
            pipeline,
            event_tx,
        }
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        self.session.state()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.session.elapsed_seconds()
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    pub fn peer(&self) -> &PeerCoordinator {
        &self.peer
    }

    /// Subscribe to recording events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    /// Start recording.
    ///
    /// Refused while recording, and while a stopped session still holds
    /// recorded time or records. Missing sensors are logged and skipped.
    pub fn start(&mut self) -> RecordingResult<()> {
        match self.session.state {
            RecordingState::Recording => {
                tracing::info!("Already running.");
                return Err(RecordingError::AlreadyRunning);
            }
            RecordingState::Stopped
                if self.session.elapsed_seconds > 0.0 || self.session.record_count() > 0 =>
            {
                tracing::info!("Stopped session not yet exported or cleared");
                return Err(RecordingError::AlreadyRunning);
            }
            RecordingState::Idle => {}
            RecordingState::Stopped | RecordingState::Exported => self.session.reset(),
        }

        self.session.state = RecordingState::Recording;
        self.session.started_at = Some(Utc::now());
        self.session.stopped_at = None;
        self.session.buffer.lock().open();

        self.subscribe_sensors();
        self.peer.send_control(ControlIntent::StartRecording);

        let _ = self.event_tx.send(RecordingEvent::Started);
        tracing::info!("Recording started (session {})", self.session.id);
        Ok(())
    }

    fn subscribe_sensors(&self) {
        let buffer = self.session.buffer();

        let position = sink(buffer.clone(), Channel::Position, SessionBuffer::accept_position);
        if let Err(e) = self.sensors.subscribe_position(position) {
            tracing::warn!("{}; recording without it", e);
        }

        let orientation = sink(
            buffer.clone(),
            Channel::Orientation,
            SessionBuffer::accept_orientation,
        );
        if let Err(e) = self
            .sensors
            .subscribe_orientation(self.config.orientation_interval(), orientation)
        {
            tracing::warn!("{}; recording without it", e);
        }

        let motion = sink(buffer, Channel::Motion, SessionBuffer::accept_motion);
        if let Err(e) = self
            .sensors
            .subscribe_motion(self.config.motion_interval(), motion)
        {
            tracing::warn!("{}; recording without it", e);
        }
    }

    /// Advance elapsed time by the measured delta. No-op unless recording.
    pub fn tick(&mut self, delta_seconds: f64) {
        if self.session.state != RecordingState::Recording {
            return;
        }
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        self.session.elapsed_seconds += delta_seconds;
        let _ = self
            .event_tx
            .send(RecordingEvent::Progress(self.session.elapsed_seconds));
    }

    /// Stop recording.
    ///
    /// The buffer stops accepting readings before the sensors are
    /// unsubscribed, so no reading that arrives after this call is kept.
    /// Incomplete ticks are dropped.
    pub fn stop(&mut self) -> RecordingResult<()> {
        if self.session.state != RecordingState::Recording {
            return Err(RecordingError::NotRecording);
        }

        let dropped = self.session.buffer.lock().close();
        self.sensors.unsubscribe_all();

        self.session.state = RecordingState::Stopped;
        self.session.stopped_at = Some(Utc::now());
        self.peer.send_control(ControlIntent::StopRecording);

        let _ = self.event_tx.send(RecordingEvent::Stopped);
        tracing::info!(
            "Recording stopped after {:.1}s: {} records, {} incomplete ticks dropped",
            self.session.elapsed_seconds,
            self.session.record_count(),
            dropped
        );
        Ok(())
    }

    /// Discard a stopped or exported session and return to idle
    pub fn clear(&mut self) -> RecordingResult<()> {
        if self.session.state == RecordingState::Recording {
            return Err(RecordingError::StillRunning);
        }
        self.session.reset();
        let _ = self.event_tx.send(RecordingEvent::Cleared);
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Single-button stop: clears a stopped session, stops a recording one
    /// that has accumulated time, and otherwise does nothing.
    pub fn stop_or_clear(&mut self) -> RecordingResult<StopOutcome> {
        if self.session.state == RecordingState::Stopped {
            self.clear()?;
            Ok(StopOutcome::Cleared)
        } else if self.session.state == RecordingState::Recording
            && self.session.elapsed_seconds > 0.0
        {
            self.stop()?;
            Ok(StopOutcome::Stopped)
        } else {
            tracing::debug!("Nothing to stop or clear");
            Ok(StopOutcome::Ignored)
        }
    }

    /// Copy of the completed records. The buffer lock is released before
    /// any file is written, so sensor callbacks never wait on disk.
    fn recorded(&self) -> Vec<CompositeRecord> {
        self.session.buffer.lock().buffer().records().to_vec()
    }

    /// Export the recorded buffer and start transferring it to the peer.
    ///
    /// The buffer is only drained once every artifact has been written, so
    /// a write failure leaves the recording intact. A link that is down
    /// does not fail the export.
    pub fn export(&mut self) -> RecordingResult<ExportSummary> {
        if self.session.state == RecordingState::Recording {
            tracing::info!("Still running.");
            return Err(RecordingError::StillRunning);
        }

        let records = self.recorded();
        if records.is_empty() {
            tracing::info!("No data recorded.");
            return Err(RecordingError::EmptyBuffer);
        }
        let mut artifacts = self.pipeline.export(&records)?;

        let duration_seconds = self.session.elapsed_seconds;
        self.session.elapsed_seconds = 0.0;
        self.session.buffer.lock().buffer_mut().drain();
        let record_count = records.len();
        self.session.state = RecordingState::Exported;

        let transferred = match self.pipeline.transfer(self.peer.link(), &mut artifacts) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Artifacts kept locally: {}", e);
                false
            }
        };

        let _ = self.event_tx.send(RecordingEvent::Exported { record_count });
        tracing::info!("Exported {} records", record_count);

        Ok(ExportSummary {
            session_id: self.session.id,
            record_count,
            duration_seconds,
            artifacts,
            transferred,
        })
    }
}

/// Build the callback a sensor stream delivers into
fn sink<T, F>(buffer: SharedBuffer, channel: Channel, accept: F) -> SensorCallback<T>
where
    T: Send + 'static,
    F: Fn(&mut SessionBuffer, T) -> bool + Send + Sync + 'static,
{
    Arc::new(move |reading: SensorReading<T>| match reading {
        Ok(sample) => {
            let mut guard = buffer.lock();
            accept(&mut guard, sample);
        }
        Err(e) => tracing::warn!("Failed to update {}: {}", channel, e),
    })
}

/// Drive [`RecordingController::tick`] every `period`, passing the time
/// actually elapsed since the previous tick.
pub fn spawn_ticker(controller: Arc<Mutex<RecordingController>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();
        loop {
            interval.tick().await;
            let now = Instant::now();
            let delta = now.duration_since(last).as_secs_f64();
            last = now;
            controller.lock().tick(delta);
        }
    })
}
