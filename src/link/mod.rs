//! Device link
//!
//! Control messages and file transfer between the wrist device and the
//! companion, behind the [`LinkAdapter`] trait.

pub mod loopback;
pub mod message;
pub mod traits;

pub use loopback::{LinkInbound, LoopbackLink};
pub use message::{ControlIntent, ControlMessage};
pub use traits::{LinkAdapter, LinkError, LinkEvent, TransferHandle};
