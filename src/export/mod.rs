//! Recording export module
//!
//! This module turns a finished recording into per-channel CSV artifacts
//! and hands them to the peer link.

pub mod codec;
pub mod pipeline;
pub mod types;

pub use pipeline::ExportPipeline;
pub use types::{ExportError, ExportOptions, TransferArtifact, TransferState};
