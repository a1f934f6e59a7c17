//! gyrosync - synchronized sensor recording across a wrist device and its
//! companion.
//!
//! The wrist device records position, orientation and motion into one
//! tick-aligned buffer, exports it as per-channel CSV files and transfers
//! them over the peer link. The companion starts and stops its own capture
//! in step and collects the received files.

pub mod capture;
pub mod config;
pub mod export;
pub mod link;
pub mod peer;
pub mod recorder;
pub mod remote;
pub mod storage;
pub mod utils;

pub use config::SyncConfig;
pub use utils::{AppError, AppResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing. `RUST_LOG` overrides `default_filter`.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
