//! Persisted-artifacts directory
//!
//! The companion keeps every received artifact, and its own capture
//! output, in one flat directory keyed by file name.

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to move {from:?} to {to:?}: {reason}")]
    FileMove {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// Extension used for companion capture files
pub const CAPTURE_EXTENSION: &str = "mp4";

const MAX_NAME_ATTEMPTS: usize = 1000;

/// `GPS.csv`, then `GPS (1).csv`, `GPS (2).csv`, ...
fn candidate_name(original: &Path, attempt: usize) -> String {
    let full = original.to_string_lossy().to_string();
    if attempt == 0 {
        return full;
    }
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(full);
    match original.extension() {
        Some(ext) => format!("{} ({}).{}", stem, attempt, ext.to_string_lossy()),
        None => format!("{} ({})", stem, attempt),
    }
}

/// Move `from` to `to`, failing with `AlreadyExists` instead of replacing
fn move_new(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
        Err(link_err) => {
            // hard links can't cross filesystems; copy into a fresh file
            tracing::debug!("hard link failed ({}), copying instead", link_err);
            let mut source = fs::File::open(from)?;
            let mut target = fs::OpenOptions::new().write(true).create_new(true).open(to)?;
            if let Err(e) = io::copy(&mut source, &mut target) {
                drop(target);
                let _ = fs::remove_file(to);
                return Err(e);
            }
        }
    }
    if let Err(e) = fs::remove_file(from) {
        tracing::warn!("Stored {:?} but could not remove it: {}", from, e);
    }
    Ok(())
}

/// Flat directory of persisted artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move an incoming file into the store.
    ///
    /// The original name is used when free; otherwise the first free
    /// `name (n).ext` is taken. An existing file is never replaced. Returns
    /// the name the file was stored under.
    pub fn accept(&self, incoming: &Path) -> Result<String, StorageError> {
        let original = incoming.file_name().ok_or_else(|| StorageError::FileMove {
            from: incoming.to_path_buf(),
            to: self.root.clone(),
            reason: "incoming path has no file name".to_string(),
        })?;
        let original = Path::new(original);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = candidate_name(original, attempt);
            let destination = self.root.join(&name);
            match move_new(incoming, &destination) {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!("{:?} already stored, kept as {}", original, name);
                    }
                    tracing::debug!("Stored artifact {} in {:?}", name, self.root);
                    return Ok(name);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::FileMove {
                        from: incoming.to_path_buf(),
                        to: destination,
                        reason: e.to_string(),
                    })
                }
            }
        }

        Err(StorageError::FileMove {
            from: incoming.to_path_buf(),
            to: self.root.clone(),
            reason: format!("no free name after {} attempts", MAX_NAME_ATTEMPTS),
        })
    }

    /// Names of stored files, sorted
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }

    /// Output path for a capture started at `at`, named `yyyyMMddHHmmss.mp4`
    pub fn capture_path(&self, at: DateTime<Local>) -> PathBuf {
        self.root
            .join(format!("{}.{}", at.format("%Y%m%d%H%M%S"), CAPTURE_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Documents");
        let store = ArtifactStore::open(&root).unwrap();

        assert!(root.is_dir());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_accept_moves_file() {
        let dir = tempdir().unwrap();
        let inbox = dir.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        let incoming = inbox.join("GPS.csv");
        fs::write(&incoming, "Time,Latitude,Longitude").unwrap();

        let store = ArtifactStore::open(dir.path().join("store")).unwrap();
        let name = store.accept(&incoming).unwrap();

        assert_eq!(name, "GPS.csv");
        assert!(!incoming.exists());
        assert!(store.contains("GPS.csv"));
        assert_eq!(store.list().unwrap(), vec!["GPS.csv"]);
    }

    #[test]
    fn test_accept_never_replaces_existing_name() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("store")).unwrap();
        fs::write(store.root().join("Motion.csv"), "old").unwrap();
        fs::write(store.root().join("Motion (1).csv"), "older").unwrap();

        let incoming = dir.path().join("Motion.csv");
        fs::write(&incoming, "new").unwrap();

        let name = store.accept(&incoming).unwrap();
        assert_eq!(name, "Motion (2).csv");
        assert!(!incoming.exists());
        assert_eq!(fs::read_to_string(store.root().join("Motion.csv")).unwrap(), "old");
        assert_eq!(fs::read_to_string(store.root().join("Motion (1).csv")).unwrap(), "older");
        assert_eq!(fs::read_to_string(store.root().join("Motion (2).csv")).unwrap(), "new");
    }

    #[test]
    fn test_accept_missing_file_is_file_move() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("store")).unwrap();

        let err = store.accept(&dir.path().join("GPS.csv")).unwrap_err();
        assert!(matches!(err, StorageError::FileMove { .. }));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_candidate_names() {
        assert_eq!(candidate_name(Path::new("GPS.csv"), 0), "GPS.csv");
        assert_eq!(candidate_name(Path::new("GPS.csv"), 3), "GPS (3).csv");
        assert_eq!(candidate_name(Path::new("README"), 1), "README (1)");
    }

    #[test]
    fn test_capture_path_format() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let at = Local.with_ymd_and_hms(2023, 11, 13, 9, 5, 7).unwrap();

        assert_eq!(
            store.capture_path(at).file_name().unwrap(),
            "20231113090507.mp4"
        );
    }
}
