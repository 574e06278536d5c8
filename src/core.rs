//! Core traits and data types for the driver.
//!
//! This module defines the contract the host framework drives the stage
//! through, using capability-based traits:
//!
//! - [`Instrument`]: base trait with lifecycle management
//! - [`Stage`]: single-axis positioner capability
//! - [`StatusUpdate`]: human-readable status messages streamed to the host
//!
//! # Command Flow
//!
//! ```text
//! Host → Stage trait methods → communication channel → physical device
//! ```
//!
//! Every operation is a direct request/response exchange with the channel
//! and resolves only once the transport call completes (or fails). The
//! driver spawns no tasks, keeps no motion state, and never polls: motion
//! completion is observed by the caller through subsequent `position()`
//! reads, compared against [`Stage::epsilon`] on the host side.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// =============================================================================
// Status Updates
// =============================================================================

/// A status message emitted by an instrument.
///
/// The analog of the host framework's status-bar updates: free-form text
/// plus enough structure for logging and correlation. Delivery is lossy if
/// nobody is subscribed, which is fine for advisory messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// UTC timestamp when the update was emitted
    pub timestamp: DateTime<Utc>,
    /// Instrument identifier (e.g., "kdc101")
    pub instrument_id: String,
    /// Human-readable message
    pub message: String,
    /// Optional instrument-specific metadata (JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl StatusUpdate {
    /// Build an update stamped with the current time.
    pub fn now(instrument_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            instrument_id: instrument_id.into(),
            message: message.into(),
            metadata: None,
        }
    }

    /// Attach JSON metadata to the update.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// =============================================================================
// Instrument State
// =============================================================================

/// Instrument lifecycle state
///
/// The stage has no intermediate motion states: it is either waiting for
/// `initialize` or holding an open communication channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentState {
    /// Instrument object created but not yet initialized
    Uninitialized,
    /// Communication channel open, ready for commands
    Ready,
}

// =============================================================================
// Core Instrument Trait
// =============================================================================

/// Base trait for all instruments.
///
/// Hardware is touched only from `initialize` onward; constructing an
/// implementor must have no side effects on the device.
#[async_trait]
pub trait Instrument: Send + Sync {
    /// Unique instrument identifier
    fn id(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> InstrumentState;

    /// Acquire the hardware connection
    ///
    /// Runs device discovery and opens the communication channel. On
    /// failure the instrument stays [`InstrumentState::Uninitialized`] and
    /// the call may simply be retried; the driver itself never retries.
    async fn initialize(&mut self) -> Result<()>;

    /// Release the hardware connection
    ///
    /// Called during host shutdown or instrument removal.
    async fn shutdown(&mut self) -> Result<()>;

    /// Subscribe to status updates
    ///
    /// Returns a broadcast receiver; multiple subscribers each see every
    /// update emitted after they subscribe.
    fn status_channel(&self) -> broadcast::Receiver<StatusUpdate>;
}

// =============================================================================
// Stage Capability Trait
// =============================================================================

/// Single-axis stage/positioner capability trait.
///
/// Hosts that control motion should work with this trait instead of
/// concrete driver types. Positions are expressed in the unit reported by
/// [`Stage::units`].
#[async_trait]
pub trait Stage: Instrument {
    /// Position unit reported to the host (e.g., "mm")
    fn units(&self) -> &str;

    /// Tolerance below which the host considers a commanded move complete
    ///
    /// Pure configuration: the driver itself never compares positions
    /// against it.
    fn epsilon(&self) -> f64;

    /// Get the current absolute position
    async fn position(&self) -> Result<f64>;

    /// Move to an absolute position
    ///
    /// Returns once the command is accepted by the device; it does not
    /// block until motion completes. Range validation, if any, is the
    /// device firmware's responsibility.
    async fn move_absolute(&mut self, target: f64) -> Result<()>;

    /// Move relative to the current position
    ///
    /// Implemented as a position read followed by an absolute move. The
    /// two steps are not atomic: a position change between them (manual
    /// jogging, a concurrent host) shifts the final target.
    async fn move_relative(&mut self, delta: f64) -> Result<()>;

    /// Move to the zero position
    async fn move_home(&mut self) -> Result<()>;

    /// Report that motion has stopped
    ///
    /// The KDC101 halts on its own when it reaches the commanded target,
    /// so this issues no command to the hardware. It reads the current
    /// position and emits it on the status channel.
    async fn stop_motion(&mut self) -> Result<()>;
}
