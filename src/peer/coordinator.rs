//! Peer coordinator
//!
//! Bridges local intents to the link and inbound link events to local
//! actions. Delivery is best-effort: an intent that cannot be sent right
//! now is logged and dropped, never queued.

use crate::link::{ControlIntent, ControlMessage, LinkAdapter, LinkEvent, LinkInbound};
use crate::remote::RemoteCaptureController;
use crate::storage::StorageError;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Link-facing half of a device
#[derive(Clone)]
pub struct PeerCoordinator {
    link: Arc<dyn LinkAdapter>,
    /// Present on the companion only
    remote: Option<Arc<RemoteCaptureController>>,
}

impl PeerCoordinator {
    /// Coordinator for the wrist device, which only sends
    pub fn new(link: Arc<dyn LinkAdapter>) -> Self {
        Self { link, remote: None }
    }

    /// Coordinator for the companion, which acts on what it receives
    pub fn with_remote(link: Arc<dyn LinkAdapter>, remote: Arc<RemoteCaptureController>) -> Self {
        Self {
            link,
            remote: Some(remote),
        }
    }

    pub fn link(&self) -> &dyn LinkAdapter {
        self.link.as_ref()
    }

    pub fn remote(&self) -> Option<&Arc<RemoteCaptureController>> {
        self.remote.as_ref()
    }

    /// Send `intent` to the peer if the link is up. Returns whether the
    /// link accepted the message.
    pub fn send_control(&self, intent: ControlIntent) -> bool {
        if !self.link.is_supported() {
            tracing::debug!("Link not supported, not sending {:?}", intent);
            return false;
        }
        if !self.link.is_reachable() || !self.link.is_activated() {
            tracing::warn!(
                "Dropping {:?}: {}",
                intent,
                self.link.unavailable()
            );
            return false;
        }

        match self.link.send(intent.to_message()) {
            Ok(()) => {
                tracing::debug!("Sent {:?}", intent);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to send message: {}", e);
                false
            }
        }
    }

    /// Act on a received control message. Returns the decoded intent, or
    /// `None` when the message was ignored.
    pub fn on_control_received(&self, message: &ControlMessage) -> Option<ControlIntent> {
        let Some(intent) = ControlIntent::from_message(message) else {
            tracing::debug!("Ignoring control message {:?}", message);
            return None;
        };

        let Some(remote) = &self.remote else {
            tracing::warn!("Received {:?} but no capture controller is attached", intent);
            return Some(intent);
        };

        tracing::info!("Message received: {:?}", intent);
        match intent {
            ControlIntent::StartRecording => {
                remote.start();
            }
            ControlIntent::StopRecording => remote.stop(),
        }
        Some(intent)
    }

    /// Store a received file and list it. Returns the stored name, or
    /// `None` on a device without an artifact store.
    pub fn on_file_received(&self, incoming: &Path) -> Result<Option<String>, StorageError> {
        let Some(remote) = &self.remote else {
            tracing::warn!("Ignoring received file {:?}", incoming);
            return Ok(None);
        };

        let name = remote.store().accept(incoming)?;
        remote.record_artifact(name.clone());
        Ok(Some(name))
    }

    /// Dispatch one inbound event, logging failures
    pub fn handle_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::Message(message) => {
                self.on_control_received(&message);
            }
            LinkEvent::File(path) => {
                if let Err(e) = self.on_file_received(&path) {
                    tracing::warn!("Failed to move file: {}", e);
                }
            }
        }
    }

    /// Dispatch inbound events until the link closes
    pub async fn run(self, mut inbound: LinkInbound) {
        while let Some(event) = inbound.recv().await {
            self.handle_event(event);
        }
        tracing::debug!("Link closed, peer dispatch finished");
    }

    /// Spawn [`run`](Self::run) on the current runtime
    pub fn spawn(&self, inbound: LinkInbound) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(inbound))
    }
}
