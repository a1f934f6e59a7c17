//! Companion-side persistent storage

pub mod artifacts;

pub use artifacts::{ArtifactStore, StorageError};
