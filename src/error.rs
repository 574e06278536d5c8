//! Custom error types for the driver.
//!
//! This module defines the primary error type, `Kdc101Error`, for the whole
//! crate. Using the `thiserror` crate, it keeps the failure classes the host
//! framework cares about distinguishable:
//!
//! - **`NoDeviceFound` / `Connection`**: discovery came back empty or the
//!   communication channel could not be opened. The adapter stays
//!   uninitialized; the caller may retry `initialize` later.
//! - **`NotConnected`**: a motion or position command was issued before a
//!   successful `initialize`.
//! - **`Communication`**: the transport failed while a command was in
//!   flight. Never retried inside the driver.
//! - **`CloseNotImplemented`**: the teardown path. The vendor handle has no
//!   documented release sequence, so `shutdown` deliberately fails instead
//!   of pretending to clean up (see DESIGN.md).
//! - **`Config`**: configuration loading or validation failed.
//!
//! All failures propagate straight to the caller with `?`; there is no
//! retry, backoff, or local recovery anywhere in the crate.

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type DriverResult<T> = std::result::Result<T, Kdc101Error>;

/// Primary error type for the driver.
#[derive(Error, Debug)]
pub enum Kdc101Error {
    /// Discovery ran but returned no controllers
    #[error("No KDC101 stage found. Check that the motor is connected and the Thorlabs software is installed")]
    NoDeviceFound,

    /// Discovery failed or the channel could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// A command was issued before a successful `initialize`
    #[error("Stage not initialized")]
    NotConnected,

    /// The transport failed while a command was in flight
    #[error("Communication error: {0}")]
    Communication(String),

    /// The teardown path, deliberately unfinished
    #[error("Termination of the communication channel is not implemented")]
    CloseNotImplemented,

    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
