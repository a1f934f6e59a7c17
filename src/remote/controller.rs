//! Companion capture controller
//!
//! Owns the companion's capture session. Recording is normally started and
//! stopped by control messages from the wrist device; the local user can
//! also toggle it directly. Received artifacts are collected into a listing.

use crate::capture::CaptureHardware;
use crate::storage::ArtifactStore;
use chrono::Local;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events emitted by the companion
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    /// Recording flag changed
    RecordingChanged(bool),
    /// An artifact was stored under this name
    ArtifactReceived(String),
}

#[derive(Debug, Default)]
struct RemoteInner {
    is_recording: bool,
    current_output: Option<PathBuf>,
    file_names: Vec<String>,
}

/// Companion-side counterpart of the recording controller
pub struct RemoteCaptureController {
    hardware: Arc<dyn CaptureHardware>,
    store: ArtifactStore,
    inner: Mutex<RemoteInner>,
    event_tx: broadcast::Sender<RemoteEvent>,
}

impl RemoteCaptureController {
    pub fn new(hardware: Arc<dyn CaptureHardware>, store: ArtifactStore) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            hardware,
            store,
            inner: Mutex::new(RemoteInner::default()),
            event_tx,
        }
    }

    /// Attach the capture input and start the session running.
    ///
    /// Failure is logged; the session then stays not running and later
    /// `start()` calls are no-ops.
    pub fn prepare_session(&self) -> bool {
        match self.hardware.prepare() {
            Ok(()) => {
                tracing::info!("Capture session running");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to prepare capture session: {}", e);
                false
            }
        }
    }

    /// Start recording. Returns whether recording actually began.
    pub fn start(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.is_recording {
            tracing::info!("Capture already recording");
            return false;
        }
        if !self.hardware.can_add_output() {
            tracing::warn!("Cannot add recording output to capture session");
            return false;
        }
        if !self.hardware.is_running() {
            tracing::warn!("Capture session is not running");
            return false;
        }

        let output = self.store.capture_path(Local::now());
        if let Err(e) = self.hardware.start_recording(&output) {
            tracing::warn!("Failed to start capture: {}", e);
            return false;
        }

        tracing::info!("Capture recording to {:?}", output);
        inner.is_recording = true;
        inner.current_output = Some(output);
        drop(inner);

        let _ = self.event_tx.send(RemoteEvent::RecordingChanged(true));
        true
    }

    /// Stop recording. Safe to call at any time, including twice.
    pub fn stop(&self) {
        self.hardware.stop_recording();

        let mut inner = self.inner.lock();
        let was_recording = std::mem::replace(&mut inner.is_recording, false);
        let output = inner.current_output.take();
        drop(inner);

        if was_recording {
            tracing::info!("Capture stopped, video at {:?}", output);
            let _ = self.event_tx.send(RemoteEvent::RecordingChanged(false));
        }
    }

    /// Local user override: stop if recording, start otherwise
    pub fn toggle(&self) -> bool {
        if self.is_recording() {
            self.stop();
            false
        } else {
            self.start()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().is_recording
    }

    /// Output path of the recording in progress
    pub fn current_output(&self) -> Option<PathBuf> {
        self.inner.lock().current_output.clone()
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Append a stored artifact to the listing
    pub fn record_artifact(&self, name: String) {
        tracing::info!("Received a file: {}", name);
        self.inner.lock().file_names.push(name.clone());
        let _ = self.event_tx.send(RemoteEvent::ArtifactReceived(name));
    }

    /// Names of artifacts received so far, in arrival order
    pub fn file_names(&self) -> Vec<String> {
        self.inner.lock().file_names.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RemoteEvent> {
        self.event_tx.subscribe()
    }
}
