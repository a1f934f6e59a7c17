//! Error types and handling
//!
//! Common error types used across the application.

use crate::capture::{CaptureError, SensorError};
use crate::export::ExportError;
use crate::link::LinkError;
use crate::recorder::RecordingError;
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Config error: {0}")]
    Config(String),
}

impl AppError {
    /// Stable code for the error, finer-grained than the variant
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Recording(e) => match e {
                RecordingError::AlreadyRunning => "ALREADY_RUNNING",
                RecordingError::StillRunning => "STILL_RUNNING",
                RecordingError::EmptyBuffer => "EMPTY_BUFFER",
                RecordingError::NotRecording => "NOT_RECORDING",
                RecordingError::Export(e) => export_code(e),
            },
            AppError::Export(e) => export_code(e),
            AppError::Link(LinkError::Unsupported) => "LINK_UNSUPPORTED",
            AppError::Link(LinkError::LinkUnavailable { .. }) => "LINK_UNAVAILABLE",
            AppError::Link(_) => "LINK_ERROR",
            AppError::Storage(StorageError::FileMove { .. }) => "FILE_MOVE_ERROR",
            AppError::Storage(StorageError::Io(_)) => "IO_ERROR",
            AppError::Sensor(SensorError::AdapterUnavailable(_)) => "ADAPTER_UNAVAILABLE",
            AppError::Sensor(_) => "SENSOR_ERROR",
            AppError::Capture(CaptureError::AdapterUnavailable(_)) => "ADAPTER_UNAVAILABLE",
            AppError::Capture(_) => "CAPTURE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

fn export_code(error: &ExportError) -> &'static str {
    match error {
        ExportError::Serialization(_) => "SERIALIZATION_ERROR",
        ExportError::LinkUnavailable(_) => "LINK_UNAVAILABLE",
        ExportError::Csv(_) => "SERIALIZATION_ERROR",
        ExportError::Parse { .. } => "PARSE_ERROR",
    }
}

/// Error response for callers outside the crate
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
