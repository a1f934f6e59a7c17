//! Runtime configuration
//!
//! One JSON document covering both devices. Every field has a default, so
//! a partial file (or none at all) is valid.

use crate::export::ExportOptions;
use crate::recorder::RecordingConfig;
use crate::utils::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub recording: RecordingConfig,
    pub export: ExportOptions,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Companion artifact storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Directory received artifacts and capture files are kept in
    pub artifacts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("Documents"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "gyrosync=info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn to_file(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        if self.recording.max_pending_ticks == 0 {
            return Err(AppError::Config("maxPendingTicks must be positive".to_string()));
        }
        let names = [
            &self.export.position_file_name,
            &self.export.orientation_file_name,
            &self.export.motion_file_name,
        ];
        if names.iter().any(|n| n.is_empty()) {
            return Err(AppError::Config("export file names must not be empty".to_string()));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(AppError::Config("export file names must be distinct".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.recording.tick_interval_secs, 0.1);
        assert_eq!(config.export.motion_file_name, "Motion.csv");
        assert_eq!(config.storage.artifacts_dir, PathBuf::from("Documents"));
        assert_eq!(config.logging.filter, "gyrosync=info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gyrosync.json");
        fs::write(
            &path,
            r#"{ "recording": { "tickIntervalSecs": 0.5 }, "export": { "outputDir": "/tmp/out" } }"#,
        )
        .unwrap();

        let config = SyncConfig::from_file(&path).unwrap();
        assert_eq!(config.recording.tick_interval_secs, 0.5);
        assert_eq!(config.recording.max_pending_ticks, 4096);
        assert_eq!(config.export.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.export.position_file_name, "GPS.csv");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gyrosync.json");
        let mut config = SyncConfig::default();
        config.storage.artifacts_dir = dir.path().join("store");
        config.to_file(&path).unwrap();

        let loaded = SyncConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.artifacts_dir, dir.path().join("store"));
    }

    #[test]
    fn test_duplicate_file_names_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gyrosync.json");
        fs::write(&path, r#"{ "export": { "motionFileName": "GPS.csv" } }"#).unwrap();

        let err = SyncConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gyrosync.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            SyncConfig::from_file(&path),
            Err(AppError::Serialization(_))
        ));
    }
}
