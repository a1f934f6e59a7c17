//! Export pipeline orchestration
//!
//! Serializes a finished recording into one artifact per channel, stores
//! the artifacts locally and hands them to the link for transfer.

use super::codec;
use super::types::{ExportError, ExportOptions, TransferArtifact, TransferState};
use crate::link::{LinkAdapter, LinkError};
use crate::recorder::channel::Channel;
use crate::recorder::samples::CompositeRecord;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::sync::oneshot;

/// Export pipeline for serializing and transferring recordings
#[derive(Debug, Clone)]
pub struct ExportPipeline {
    options: ExportOptions,
}

impl ExportPipeline {
    /// Create a new export pipeline
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Write one artifact per channel and return all three.
    ///
    /// Every channel gets an artifact even when `records` is empty, in
    /// which case the file holds only the header row.
    pub fn export(&self, records: &[CompositeRecord]) -> Result<Vec<TransferArtifact>, ExportError> {
        tracing::info!(
            "Exporting {} records to {:?}",
            records.len(),
            self.options.output_dir
        );
        std::fs::create_dir_all(&self.options.output_dir)?;

        let mut artifacts = Vec::with_capacity(3);
        for channel in Channel::all() {
            let name = self.options.file_name(channel).to_string();
            let content = codec::render(channel, records)?;
            let path = self.options.output_dir.join(&name);

            write_atomically(&path, &content).map_err(|e| {
                tracing::error!("Failed to write {} file: {}", channel, e);
                e
            })?;
            tracing::debug!("Wrote {} ({} bytes)", name, content.len());

            artifacts.push(TransferArtifact::new(name, channel, content, path));
        }

        Ok(artifacts)
    }

    /// Hand stored artifacts to the link.
    ///
    /// Fails without touching the artifacts when the link is not both
    /// reachable and activated. Otherwise each artifact becomes in-flight
    /// (or unknown if the link gives no status); completion is logged in
    /// the background and never awaited here.
    pub fn transfer(
        &self,
        link: &dyn LinkAdapter,
        artifacts: &mut [TransferArtifact],
    ) -> Result<(), ExportError> {
        if !link.is_available() {
            let err = link.unavailable();
            tracing::warn!("Session is not activated or reachable: {}", err);
            return Err(ExportError::LinkUnavailable(err));
        }

        let mut any_transferring = false;
        for artifact in artifacts.iter_mut() {
            match link.transfer_file(artifact.path()) {
                Ok(mut handle) => {
                    if handle.is_transferring() {
                        any_transferring = true;
                        artifact.set_transfer_state(TransferState::InFlight);
                    } else {
                        artifact.set_transfer_state(TransferState::Unknown);
                    }
                    if let Some(completion) = handle.take_completion() {
                        watch_completion(artifact.name().to_string(), completion);
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to start transfer of {}: {}", artifact.name(), e);
                    artifact.set_transfer_state(TransferState::Unknown);
                }
            }
        }

        if any_transferring {
            tracing::info!("Files are being transferred.");
        } else {
            tracing::info!("Files are not being transferred.");
        }
        Ok(())
    }
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

/// Write through a temp file in the same directory so readers never see a
/// half-written artifact
fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn watch_completion(name: String, completion: oneshot::Receiver<Result<(), LinkError>>) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No runtime to watch transfer of {}", name);
        return;
    };
    runtime.spawn(async move {
        match completion.await {
            Ok(Ok(())) => tracing::info!("Transfer of {} finished", name),
            Ok(Err(e)) => tracing::warn!("Transfer of {} failed: {}", name, e),
            Err(_) => tracing::debug!("Transfer of {} dropped without a result", name),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LoopbackLink;
    use crate::recorder::samples::{MotionSample, OrientationSample, PositionSample, Vector3};
    use tempfile::tempdir;

    fn records(n: usize) -> Vec<CompositeRecord> {
        (0..n)
            .map(|i| {
                let t = 100.0 + i as f64 * 0.5;
                CompositeRecord {
                    position: PositionSample::new(t, 25.0, 121.0),
                    orientation: OrientationSample::new(t, Vector3::new(0.0, 0.1, 0.2)),
                    motion: MotionSample::new(t, Vector3::new(0.0, 0.0, -1.0)),
                }
            })
            .collect()
    }

    #[test]
    fn test_export_writes_three_artifacts() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(ExportOptions::with_output_dir(dir.path()));

        let artifacts = pipeline.export(&records(4)).unwrap();

        assert_eq!(artifacts.len(), 3);
        let names: Vec<_> = artifacts.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["GPS.csv", "GravityAndAttitude.csv", "Motion.csv"]);
        for artifact in &artifacts {
            assert_eq!(artifact.row_count(), 4);
            assert_eq!(artifact.transfer_state(), TransferState::Pending);
            let on_disk = std::fs::read_to_string(artifact.path()).unwrap();
            assert_eq!(on_disk, artifact.content());
        }
    }

    #[test]
    fn test_export_empty_is_header_only() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(ExportOptions::with_output_dir(dir.path().join("nested")));

        let artifacts = pipeline.export(&[]).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts.iter().all(|a| a.row_count() == 0));
        assert_eq!(artifacts[2].content(), codec::MOTION_HEADER);
    }

    #[test]
    fn test_export_overwrites_previous_files() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(ExportOptions::with_output_dir(dir.path()));
        pipeline.export(&records(5)).unwrap();
        let artifacts = pipeline.export(&records(2)).unwrap();

        let on_disk = std::fs::read_to_string(artifacts[0].path()).unwrap();
        assert_eq!(on_disk.lines().count(), 3);
    }

    #[test]
    fn test_transfer_requires_available_link() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(ExportOptions::with_output_dir(dir.path()));
        let mut artifacts = pipeline.export(&records(1)).unwrap();

        let ((watch, _), _) = LoopbackLink::pair().unwrap();
        watch.set_activated(false);

        let err = pipeline.transfer(&watch, &mut artifacts).unwrap_err();
        assert!(matches!(err, ExportError::LinkUnavailable(_)));
        for artifact in &artifacts {
            assert_eq!(artifact.transfer_state(), TransferState::Pending);
            assert!(artifact.path().exists());
        }
        assert!(watch.transferred_files().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_marks_in_flight() {
        let dir = tempdir().unwrap();
        let pipeline = ExportPipeline::new(ExportOptions::with_output_dir(dir.path()));
        let mut artifacts = pipeline.export(&records(2)).unwrap();

        let ((watch, _), (_phone, mut phone_rx)) = LoopbackLink::pair().unwrap();
        pipeline.transfer(&watch, &mut artifacts).unwrap();

        assert!(artifacts
            .iter()
            .all(|a| a.transfer_state() == TransferState::InFlight));
        assert_eq!(watch.transferred_files().len(), 3);
        for _ in 0..3 {
            assert!(phone_rx.recv().await.is_some());
        }
    }
}
