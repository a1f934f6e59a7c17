//! Recording system module
//!
//! Wrist-side recording:
//! - Timestamped samples and the composite record built from them
//! - SampleBuffer joining the three channels by tick
//! - RecordingController driving the session lifecycle

pub mod buffer;
pub mod channel;
pub mod controller;
pub mod samples;
pub mod state;

pub use buffer::SampleBuffer;
pub use channel::{Channel, RecordingError, RecordingResult};
pub use controller::{spawn_ticker, ExportSummary, RecordingController, RecordingEvent, StopOutcome};
pub use samples::{CompositeRecord, MotionSample, OrientationSample, PositionSample, Tick, Vector3};
pub use state::{RecordingConfig, RecordingSession, RecordingState, SessionBuffer, SessionSnapshot, SharedBuffer};
