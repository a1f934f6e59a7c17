//! Export types and configuration
//!
//! This module defines the artifacts produced by an export, their transfer
//! status, the export options and the export errors.

use crate::link::LinkError;
use crate::recorder::channel::Channel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where an artifact stands with respect to the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TransferState {
    /// Stored locally, not handed to the link
    #[default]
    Pending,
    /// The link accepted the file and reports it as transferring
    InFlight,
    /// Handed to the link, but the link gave no usable status
    Unknown,
}

/// One exported, channel-specific file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferArtifact {
    name: String,
    channel: Channel,
    content: String,
    path: PathBuf,
    transfer_state: TransferState,
}

impl TransferArtifact {
    pub fn new(name: String, channel: Channel, content: String, path: PathBuf) -> Self {
        Self {
            name,
            channel,
            content,
            path,
            transfer_state: TransferState::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Location of the locally stored copy
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn transfer_state(&self) -> TransferState {
        self.transfer_state
    }

    pub(crate) fn set_transfer_state(&mut self, state: TransferState) {
        self.transfer_state = state;
    }

    /// Number of data rows (header excluded)
    pub fn row_count(&self) -> usize {
        self.content.lines().count().saturating_sub(1)
    }
}

/// Export configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Directory artifacts are written to
    pub output_dir: PathBuf,
    /// File name of the position artifact
    pub position_file_name: String,
    /// File name of the orientation artifact
    pub orientation_file_name: String,
    /// File name of the motion artifact
    pub motion_file_name: String,
}

impl ExportOptions {
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn file_name(&self, channel: Channel) -> &str {
        match channel {
            Channel::Position => &self.position_file_name,
            Channel::Orientation => &self.orientation_file_name,
            Channel::Motion => &self.motion_file_name,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            position_file_name: "GPS.csv".to_string(),
            orientation_file_name: "GravityAndAttitude.csv".to_string(),
            motion_file_name: "Motion.csv".to_string(),
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write artifact: {0}")]
    Serialization(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Link unavailable: {0}")]
    LinkUnavailable(LinkError),

    #[error("Malformed {channel} data at line {line}: {message}")]
    Parse {
        channel: Channel,
        line: usize,
        message: String,
    },
}

impl From<ExportError> for String {
    fn from(e: ExportError) -> String {
        e.to_string()
    }
}
