//! Thorlabs KDC101 Brushed Motor Controller Driver
//!
//! Presents a single-axis positioner to the host framework over a
//! vendor-supplied communication channel. The driver is a thin
//! pass-through: it forwards move and position commands and keeps no
//! motion state of its own. The controller stops by itself when it
//! reaches the commanded position, so there is no stop command to send
//! and no completion to wait for.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use daq_driver_kdc101::config::StageSettings;
//! use daq_driver_kdc101::core::{Instrument, Stage};
//! use daq_driver_kdc101::hardware::MockBus;
//! use daq_driver_kdc101::instrument::Kdc101Stage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut stage = Kdc101Stage::new(&StageSettings::default(), Arc::new(MockBus::new()));
//!     stage.initialize().await?;
//!
//!     stage.move_absolute(12.5).await?;
//!     println!("Position: {:.2} {}", stage.position().await?, stage.units());
//!
//!     Ok(())
//! }
//! ```

use crate::config::StageSettings;
use crate::core::{Instrument, InstrumentState, Stage, StatusUpdate};
use crate::error::Kdc101Error;
use crate::hardware::channel::{DeviceBus, MotorChannel};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Driver for the Thorlabs KDC101 brushed DC motor controller.
///
/// Holds at most one open [`MotorChannel`] at a time. The channel is
/// acquired in [`Instrument::initialize`], never at construction, so
/// creating the driver probes no hardware.
pub struct Kdc101Stage {
    /// Instrument identifier used in logs and status updates
    id: String,
    /// Position unit declared to the host
    units: String,
    /// Host-side move tolerance declared to the host
    epsilon: f64,
    /// Discovery/connection surface of the vendor stack
    bus: Arc<dyn DeviceBus>,
    /// Open channel to the controller, `None` until initialized
    channel: Option<Box<dyn MotorChannel>>,
    /// Status streaming
    status_tx: broadcast::Sender<StatusUpdate>,
}

impl Kdc101Stage {
    /// Create a new KDC101 driver instance.
    ///
    /// # Arguments
    /// * `settings` - Stage settings (id, units, epsilon) from configuration
    /// * `bus` - The vendor discovery/connection surface
    pub fn new(settings: &StageSettings, bus: Arc<dyn DeviceBus>) -> Self {
        let (status_tx, _rx) = broadcast::channel(1024);

        Self {
            id: settings.id.clone(),
            units: settings.units.clone(),
            epsilon: settings.epsilon,
            bus,
            channel: None,
            status_tx,
        }
    }

    fn channel(&self) -> Result<&dyn MotorChannel> {
        self.channel
            .as_deref()
            .ok_or_else(|| Kdc101Error::NotConnected.into())
    }

    fn emit_status(&self, update: StatusUpdate) {
        // Lossy by design: nobody subscribed is not an error
        let _ = self.status_tx.send(update);
    }
}

#[async_trait]
impl Instrument for Kdc101Stage {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> InstrumentState {
        if self.channel.is_some() {
            InstrumentState::Ready
        } else {
            InstrumentState::Uninitialized
        }
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(anyhow!(
                "KDC101 '{}' is already initialized; at most one channel may be open",
                self.id
            ));
        }

        info!("Initializing KDC101 '{}'", self.id);

        let serials = match self.bus.find_available().await {
            Ok(serials) => serials,
            Err(e) => {
                warn!(
                    "KDC101 discovery failed: {e:#}. Check whether the motor is properly \
                     connected or whether the correct Thorlabs software has been installed"
                );
                return Err(Kdc101Error::Connection(format!("discovery failed: {e:#}")).into());
            }
        };

        let serial = match serials.first() {
            Some(serial) => serial,
            None => {
                warn!(
                    "No KDC101 connected to this computer could be found. Check whether the \
                     motor is properly connected or whether the correct Thorlabs software has \
                     been installed"
                );
                return Err(Kdc101Error::NoDeviceFound.into());
            }
        };

        let channel = self
            .bus
            .open(serial)
            .await
            .map_err(|e| Kdc101Error::Connection(format!("failed to open channel to {serial}: {e:#}")))?;

        self.channel = Some(channel);
        info!("KDC101 '{}' connected to controller {serial}", self.id);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        // The vendor handle has no documented release sequence. Fail loudly
        // rather than silently dropping the channel; see DESIGN.md.
        Err(Kdc101Error::CloseNotImplemented.into())
    }

    fn status_channel(&self) -> broadcast::Receiver<StatusUpdate> {
        self.status_tx.subscribe()
    }
}

#[async_trait]
impl Stage for Kdc101Stage {
    fn units(&self) -> &str {
        &self.units
    }

    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    async fn position(&self) -> Result<f64> {
        let position = self
            .channel()?
            .current_position()
            .await
            .map_err(|e| Kdc101Error::Communication(format!("position query failed: {e:#}")))?;

        Ok(position)
    }

    async fn move_absolute(&mut self, target: f64) -> Result<()> {
        self.channel()?
            .move_to_position(target)
            .await
            .map_err(|e| Kdc101Error::Communication(format!("move command failed: {e:#}")))?;

        info!("KDC101 '{}' moving to {:.3} {}", self.id, target, self.units);
        Ok(())
    }

    async fn move_relative(&mut self, delta: f64) -> Result<()> {
        // Read-then-write: the position can change between the two calls
        // (manual jogging), shifting the final target
        let current = self.position().await?;
        self.move_absolute(current + delta).await
    }

    async fn move_home(&mut self) -> Result<()> {
        self.move_absolute(0.0).await
    }

    async fn stop_motion(&mut self) -> Result<()> {
        // The motor stops automatically when it reaches the given position;
        // only read back where it is and tell the host
        let position = self.position().await?;
        let message = format!(
            "Motor stopped at position {position:.2} {units}.",
            units = self.units
        );

        info!("KDC101 '{}': {message}", self.id);
        self.emit_status(
            StatusUpdate::now(&self.id, message).with_metadata(json!({ "position": position })),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockBus;

    fn test_stage(bus: MockBus) -> Kdc101Stage {
        Kdc101Stage::new(&StageSettings::default(), Arc::new(bus))
    }

    #[test]
    fn test_creation_probes_no_hardware() {
        let bus = MockBus::failing("discovery must not run at construction");
        let stage = test_stage(bus);

        assert_eq!(stage.id(), "kdc101");
        assert_eq!(stage.state(), InstrumentState::Uninitialized);
        assert_eq!(stage.units(), "mm");
        assert_eq!(stage.epsilon(), 0.05);
    }

    #[tokio::test]
    async fn test_double_initialize_rejected() {
        let mut stage = test_stage(MockBus::new());

        stage.initialize().await.unwrap();
        assert_eq!(stage.state(), InstrumentState::Ready);

        let result = stage.initialize().await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("already initialized"));
    }

    #[tokio::test]
    async fn test_settings_flow_through() {
        let settings = StageSettings {
            id: "delay_stage".to_string(),
            units: "mm".to_string(),
            epsilon: 0.01,
        };
        let stage = Kdc101Stage::new(&settings, Arc::new(MockBus::new()));

        assert_eq!(stage.id(), "delay_stage");
        assert_eq!(stage.epsilon(), 0.01);
    }
}
