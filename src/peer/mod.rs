//! Cross-device coordination

pub mod coordinator;

pub use coordinator::PeerCoordinator;
