//! Companion device capture

pub mod controller;

pub use controller::{RemoteCaptureController, RemoteEvent};
