//! Capture sources
//!
//! Sensor streams on the wrist device and the capture hardware on the
//! companion. Platform bindings implement the traits; the scripted
//! implementations stand in for them in tests and the simulator.

pub mod scripted;
pub mod traits;

pub use scripted::{ScriptedCamera, ScriptedSensors};
pub use traits::{
    CaptureError, CaptureHardware, SensorAdapter, SensorCallback, SensorError, SensorReading,
};
