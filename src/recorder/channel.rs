//! Sensor channels and recording errors

use crate::export::types::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the three sensor streams a tick is fused from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Position,
    Orientation,
    Motion,
}

impl Channel {
    /// All channels in export order
    pub fn all() -> [Channel; 3] {
        [Channel::Position, Channel::Orientation, Channel::Motion]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Position => "position",
            Channel::Orientation => "orientation",
            Channel::Motion => "motion",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Recording already running")]
    AlreadyRunning,

    #[error("Recording still running")]
    StillRunning,

    #[error("No data recorded")]
    EmptyBuffer,

    #[error("Not recording")]
    NotRecording,

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;
