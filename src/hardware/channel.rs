//! Communication-channel traits for the KDC101 controller.
//!
//! The vendor SDK surfaces two things: an enumeration call that lists the
//! controllers reachable from this machine, and a per-device connection
//! object that accepts position commands. Both are modeled as traits here
//! so the driver can be exercised against mocks and so the transport
//! (USB-HID, serial, vendor DLL) stays opaque to this crate.

use anyhow::Result;
use async_trait::async_trait;

/// An open communication channel to one KDC101 controller.
///
/// The device owns the position; the channel only reads and writes it.
/// Implementations are request/response: each call returns once the
/// transport exchange completes. A channel is not designed for concurrent
/// access from multiple callers.
#[async_trait]
pub trait MotorChannel: Send + Sync {
    /// Query the current absolute position, in millimeters.
    async fn current_position(&self) -> Result<f64>;

    /// Command a move to an absolute position, in millimeters.
    ///
    /// The controller accepts the target and moves on its own; the call
    /// does not wait for motion to finish.
    async fn move_to_position(&self, position: f64) -> Result<()>;
}

/// Discovery and connection surface of the vendor stack.
///
/// `find_available` is called once per `initialize`; opening a channel for
/// a serial number it returned may still fail (device unplugged in
/// between, driver conflict), which surfaces as a connection error.
#[async_trait]
pub trait DeviceBus: Send + Sync {
    /// Enumerate the serial numbers of reachable KDC101 controllers.
    async fn find_available(&self) -> Result<Vec<String>>;

    /// Open a communication channel to the controller with the given
    /// serial number.
    async fn open(&self, serial: &str) -> Result<Box<dyn MotorChannel>>;
}
