//! Link trait definitions
//!
//! The link is the best-effort channel between the paired devices. It
//! carries control messages and whole files; pairing and activation are
//! the transport's business.

use super::message::ControlMessage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::oneshot;

/// Link errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("Link not supported on this device")]
    Unsupported,

    #[error("Link unavailable (reachable: {reachable}, activated: {activated})")]
    LinkUnavailable { reachable: bool, activated: bool },

    #[error("Failed to send message: {0}")]
    Send(String),

    #[error("File transfer failed: {0}")]
    Transfer(String),
}

/// Transport-side view of one outgoing file
#[derive(Debug)]
pub struct TransferHandle {
    file_name: String,
    is_transferring: bool,
    completion: Option<oneshot::Receiver<Result<(), LinkError>>>,
}

impl TransferHandle {
    pub fn new(
        file_name: impl Into<String>,
        is_transferring: bool,
        completion: Option<oneshot::Receiver<Result<(), LinkError>>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            is_transferring,
            completion,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_transferring(&self) -> bool {
        self.is_transferring
    }

    /// Completion notification, if the transport provides one
    pub fn take_completion(&mut self) -> Option<oneshot::Receiver<Result<(), LinkError>>> {
        self.completion.take()
    }
}

/// Something arriving from the peer
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A control message was received
    Message(ControlMessage),
    /// A file finished arriving and sits at this temporary path
    File(PathBuf),
}

/// Outbound side of the link between the two devices
pub trait LinkAdapter: Send + Sync {
    fn is_supported(&self) -> bool;

    fn is_reachable(&self) -> bool;

    fn is_activated(&self) -> bool;

    /// Fire-and-forget message delivery. No reply is expected.
    fn send(&self, message: ControlMessage) -> Result<(), LinkError>;

    /// Queue a file for bulk transfer
    fn transfer_file(&self, path: &Path) -> Result<TransferHandle, LinkError>;

    /// Supported, reachable and activated
    fn is_available(&self) -> bool {
        self.is_supported() && self.is_reachable() && self.is_activated()
    }

    /// Error describing why the link is not available
    fn unavailable(&self) -> LinkError {
        if !self.is_supported() {
            LinkError::Unsupported
        } else {
            LinkError::LinkUnavailable {
                reachable: self.is_reachable(),
                activated: self.is_activated(),
            }
        }
    }
}
