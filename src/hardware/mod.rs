//! Hardware abstraction layer
//!
//! This module defines the traits the driver talks to the vendor stack
//! through, plus mock implementations for testing without hardware. The
//! real Thorlabs transport (USB/APT) lives behind these traits and is not
//! part of this crate.

pub mod channel;
pub mod mock;

pub use channel::{DeviceBus, MotorChannel};
pub use mock::{MockBus, MockChannel};
