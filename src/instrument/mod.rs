//! Instrument implementations
//!
//! Drivers in this module implement the [`crate::core::Instrument`] and
//! [`crate::core::Stage`] traits over an injected hardware channel.

pub mod kdc101;

pub use kdc101::Kdc101Stage;
