// src/io.rs - Boundaries between the control loop and the outside world
//
// Hardware outputs, operator buttons, the message bus and the provisioning
// portal are all reached through these traits so the engine can run against
// real adapters or test doubles.

use crate::{alarm::Indicators, error::ConnectivityError, error::Result};
use async_trait::async_trait;
use tracing::info;

/// Indicator lights and siren.
pub trait Actuator: Send {
    fn show_indicators(&mut self, indicators: &Indicators);
    fn set_siren(&mut self, on: bool);
    /// Every output off.
    fn darken(&mut self);
}

/// Physical operator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Forget the limits record and return to limits provisioning
    ReconfigureLimits,
    /// Forget the network credentials
    ResetNetwork,
    /// Silence the siren
    StopSiren,
}

/// Button source polled by the housekeeping tick.
pub trait ControlPanel: Send {
    /// Buttons pressed since the previous poll.
    fn pressed(&mut self) -> Vec<Button>;
}

/// Payload published on the siren-off topic whenever the siren goes quiet.
pub const RESET_PAYLOAD: &str = "reset";

/// Inputs that reach the control loop asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Remote command forcing the siren on
    SirenOn,
    Button(Button),
}

/// Outbound side of the message bus.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> std::result::Result<(), ConnectivityError>;
}

/// Server accepting limits submissions while the device is unconfigured.
pub trait ProvisioningPortal: Send {
    fn open(&mut self) -> Result<()>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Actuator that only logs, for running without hardware.
#[derive(Debug, Default)]
pub struct LoggingActuator {
    indicators: Option<Indicators>,
    siren: bool,
}

impl Actuator for LoggingActuator {
    fn show_indicators(&mut self, indicators: &Indicators) {
        if self.indicators.as_ref() != Some(indicators) {
            info!(
                "Indicators: avian {}, reptilian {}",
                indicators.avian, indicators.reptilian
            );
            self.indicators = Some(*indicators);
        }
    }

    fn set_siren(&mut self, on: bool) {
        if self.siren != on {
            info!("Siren {}", if on { "on" } else { "off" });
            self.siren = on;
        }
    }

    fn darken(&mut self) {
        self.indicators = None;
        self.siren = false;
        info!("All outputs off");
    }
}

/// Panel with no buttons.
#[derive(Debug, Default)]
pub struct IdlePanel;

impl ControlPanel for IdlePanel {
    fn pressed(&mut self) -> Vec<Button> {
        Vec::new()
    }
}
