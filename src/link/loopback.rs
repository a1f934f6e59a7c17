//! In-process loopback link
//!
//! Two connected endpoints for running both devices in one process. Files
//! are copied into a shared staging directory, named after the original
//! file, and announced to the other endpoint as a [`LinkEvent::File`].

use super::message::ControlMessage;
use super::traits::{LinkAdapter, LinkError, LinkEvent, TransferHandle};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct LinkStatus {
    supported: bool,
    reachable: bool,
    activated: bool,
}

/// One end of a loopback link
#[derive(Clone)]
pub struct LoopbackLink {
    status: Arc<Mutex<LinkStatus>>,
    outbound: mpsc::UnboundedSender<LinkEvent>,
    staging: Arc<TempDir>,
    sent: Arc<Mutex<Vec<ControlMessage>>>,
    transferred: Arc<Mutex<Vec<PathBuf>>>,
}

/// Receiving half handed to whoever dispatches inbound events
pub type LinkInbound = mpsc::UnboundedReceiver<LinkEvent>;

impl LoopbackLink {
    /// Create two connected endpoints, each with the receiver for events
    /// sent by the other one.
    pub fn pair() -> std::io::Result<((LoopbackLink, LinkInbound), (LoopbackLink, LinkInbound))> {
        let staging = Arc::new(tempfile::Builder::new().prefix("gyrosync-link").tempdir()?);
        let (to_b, b_inbound) = mpsc::unbounded_channel();
        let (to_a, a_inbound) = mpsc::unbounded_channel();

        let a = Self::endpoint(to_b, staging.clone());
        let b = Self::endpoint(to_a, staging);
        Ok(((a, a_inbound), (b, b_inbound)))
    }

    fn endpoint(outbound: mpsc::UnboundedSender<LinkEvent>, staging: Arc<TempDir>) -> Self {
        Self {
            status: Arc::new(Mutex::new(LinkStatus {
                supported: true,
                reachable: true,
                activated: true,
            })),
            outbound,
            staging,
            sent: Arc::new(Mutex::new(Vec::new())),
            transferred: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.status.lock().supported = supported;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.status.lock().reachable = reachable;
    }

    pub fn set_activated(&self, activated: bool) {
        self.status.lock().activated = activated;
    }

    /// Messages successfully handed to the peer
    pub fn sent_messages(&self) -> Vec<ControlMessage> {
        self.sent.lock().clone()
    }

    /// Source paths of files handed to the peer
    pub fn transferred_files(&self) -> Vec<PathBuf> {
        self.transferred.lock().clone()
    }

    fn stage(&self, path: &Path) -> Result<PathBuf, LinkError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| LinkError::Transfer(format!("not a file: {:?}", path)))?;
        // one directory per transfer so repeated names don't clobber each other
        let slot = self.staging.path().join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&slot).map_err(|e| LinkError::Transfer(e.to_string()))?;
        let staged = slot.join(file_name);
        std::fs::copy(path, &staged).map_err(|e| LinkError::Transfer(e.to_string()))?;
        Ok(staged)
    }
}

impl LinkAdapter for LoopbackLink {
    fn is_supported(&self) -> bool {
        self.status.lock().supported
    }

    fn is_reachable(&self) -> bool {
        self.status.lock().reachable
    }

    fn is_activated(&self) -> bool {
        self.status.lock().activated
    }

    fn send(&self, message: ControlMessage) -> Result<(), LinkError> {
        if !self.is_available() {
            return Err(self.unavailable());
        }
        self.outbound
            .send(LinkEvent::Message(message.clone()))
            .map_err(|_| LinkError::Send("peer endpoint closed".to_string()))?;
        self.sent.lock().push(message);
        Ok(())
    }

    fn transfer_file(&self, path: &Path) -> Result<TransferHandle, LinkError> {
        if !self.is_available() {
            return Err(self.unavailable());
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let staged = self.stage(path)?;
        let (done_tx, done_rx) = oneshot::channel();
        let result = self
            .outbound
            .send(LinkEvent::File(staged))
            .map_err(|_| LinkError::Transfer("peer endpoint closed".to_string()));
        let transferring = result.is_ok();
        if transferring {
            self.transferred.lock().push(path.to_path_buf());
        }
        let _ = done_tx.send(result);

        Ok(TransferHandle::new(file_name, transferring, Some(done_rx)))
    }
}
