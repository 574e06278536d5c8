//! Mock hardware implementations
//!
//! Simulated KDC101 controllers for testing without physical hardware.
//! The mock channel reaches its commanded target instantly and records
//! every move target it receives, so tests can assert exactly which
//! commands the driver issued.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hardware::channel::{DeviceBus, MotorChannel};

// =============================================================================
// MockChannel - Simulated Controller Connection
// =============================================================================

/// Mock communication channel with position tracking.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the driver owns another.
///
/// # Example
///
/// ```rust,ignore
/// let channel = MockChannel::with_position(10.0);
/// channel.move_to_position(15.0).await?;
/// assert_eq!(channel.commanded_moves().await, vec![15.0]);
/// ```
#[derive(Clone)]
pub struct MockChannel {
    position: Arc<RwLock<f64>>,
    commands: Arc<RwLock<Vec<f64>>>,
    fault: Arc<RwLock<Option<String>>>,
}

impl MockChannel {
    /// Create a new mock channel at position 0.0mm
    pub fn new() -> Self {
        Self::with_position(0.0)
    }

    /// Create a mock channel at a specific starting position
    pub fn with_position(position: f64) -> Self {
        Self {
            position: Arc::new(RwLock::new(position)),
            commands: Arc::new(RwLock::new(Vec::new())),
            fault: Arc::new(RwLock::new(None)),
        }
    }

    /// Overwrite the simulated position without recording a command.
    ///
    /// Stands in for motion the driver did not command, e.g. manual
    /// jogging on the controller's front panel.
    pub async fn set_position(&self, position: f64) {
        *self.position.write().await = position;
    }

    /// All move targets received, in order
    pub async fn commanded_moves(&self) -> Vec<f64> {
        self.commands.read().await.clone()
    }

    /// Make every subsequent transport call fail with the given message
    pub async fn inject_fault(&self, message: &str) {
        *self.fault.write().await = Some(message.to_string());
    }

    /// Clear an injected fault
    pub async fn clear_fault(&self) {
        *self.fault.write().await = None;
    }

    async fn check_fault(&self) -> Result<()> {
        match self.fault.read().await.as_ref() {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MotorChannel for MockChannel {
    async fn current_position(&self) -> Result<f64> {
        self.check_fault().await?;
        Ok(*self.position.read().await)
    }

    async fn move_to_position(&self, position: f64) -> Result<()> {
        self.check_fault().await?;
        self.commands.write().await.push(position);
        // The simulated controller reaches its target instantly
        *self.position.write().await = position;
        Ok(())
    }
}

// =============================================================================
// MockBus - Simulated Discovery
// =============================================================================

/// Mock discovery/connection surface.
///
/// By default one controller is reachable and `open` hands out clones of a
/// shared [`MockChannel`]. The empty and failing variants reproduce the
/// two discovery failure modes: nothing connected, and the vendor stack
/// itself erroring out.
pub struct MockBus {
    serials: Vec<String>,
    channel: MockChannel,
    discovery_error: Option<String>,
}

impl MockBus {
    /// A bus with a single reachable controller
    pub fn new() -> Self {
        Self::with_channel(MockChannel::new())
    }

    /// A bus with a single reachable controller behind the given channel
    pub fn with_channel(channel: MockChannel) -> Self {
        Self {
            serials: vec!["27000001".to_string()],
            channel,
            discovery_error: None,
        }
    }

    /// A bus with no controllers connected
    pub fn empty() -> Self {
        Self {
            serials: Vec::new(),
            channel: MockChannel::new(),
            discovery_error: None,
        }
    }

    /// A bus whose discovery call itself fails
    pub fn failing(message: &str) -> Self {
        Self {
            serials: Vec::new(),
            channel: MockChannel::new(),
            discovery_error: Some(message.to_string()),
        }
    }

    /// The shared channel handed out by `open`
    pub fn channel(&self) -> MockChannel {
        self.channel.clone()
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBus for MockBus {
    async fn find_available(&self) -> Result<Vec<String>> {
        match &self.discovery_error {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(self.serials.clone()),
        }
    }

    async fn open(&self, serial: &str) -> Result<Box<dyn MotorChannel>> {
        if !self.serials.iter().any(|s| s == serial) {
            return Err(anyhow!("No KDC101 with serial number {serial}"));
        }
        Ok(Box::new(self.channel.clone()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_channel_moves_and_records() {
        let channel = MockChannel::new();

        assert_eq!(channel.current_position().await.unwrap(), 0.0);

        channel.move_to_position(10.0).await.unwrap();
        assert_eq!(channel.current_position().await.unwrap(), 10.0);

        channel.move_to_position(-2.5).await.unwrap();
        assert_eq!(channel.commanded_moves().await, vec![10.0, -2.5]);
    }

    #[tokio::test]
    async fn test_mock_channel_fault_injection() {
        let channel = MockChannel::with_position(5.0);

        channel.inject_fault("usb transfer failed").await;
        assert!(channel.current_position().await.is_err());
        assert!(channel.move_to_position(1.0).await.is_err());

        // Faulted calls must not be recorded as commands
        assert!(channel.commanded_moves().await.is_empty());

        channel.clear_fault().await;
        assert_eq!(channel.current_position().await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_mock_channel_clones_share_state() {
        let channel = MockChannel::new();
        let observer = channel.clone();

        channel.move_to_position(7.5).await.unwrap();
        assert_eq!(observer.current_position().await.unwrap(), 7.5);
        assert_eq!(observer.commanded_moves().await, vec![7.5]);
    }

    #[tokio::test]
    async fn test_mock_bus_discovery() {
        let bus = MockBus::new();
        let serials = bus.find_available().await.unwrap();
        assert_eq!(serials.len(), 1);

        let channel = bus.open(&serials[0]).await.unwrap();
        assert_eq!(channel.current_position().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_mock_bus_empty_and_failing() {
        let bus = MockBus::empty();
        assert!(bus.find_available().await.unwrap().is_empty());
        assert!(bus.open("27000001").await.is_err());

        let bus = MockBus::failing("usb enumeration failed");
        let result = bus.find_available().await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("usb enumeration failed"));
    }
}
