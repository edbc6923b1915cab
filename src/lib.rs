//! HABITAT - enclosure climate monitoring engine
//!
//! Samples temperature and humidity for an avian and a reptilian enclosure,
//! classifies each reading against operator-configured bands, folds the four
//! results into one worst-case decision per cycle, drives indicator and siren
//! outputs and publishes a snapshot of every cycle over MQTT.
//!
//! # Feature Flags
//!
//! - `mqtt`: rumqttc bus adapter ([`mqtt`])
//! - `portal`: axum limits provisioning server ([`portal`])
//! - `simulation`: random-walk reading supplier for running without sensors
//!
//! # Example
//!
//! ```rust
//! use habitat::{evaluate, Band, CycleReadings, Limits, Reading, Severity};
//!
//! let limits = Limits {
//!     avian_temperature: Band::new(20, 22, 28, 32),
//!     avian_humidity: Band::new(40, 50, 60, 70),
//!     reptilian_temperature: Band::new(24, 27, 33, 38),
//!     reptilian_humidity: Band::new(30, 35, 45, 55),
//! };
//! let readings = CycleReadings::new(Reading::new(19.0, 55.0), Reading::new(30.0, 40.0));
//!
//! assert_eq!(evaluate(&limits, &readings).status.decision, Severity::Critical);
//! ```

// ============================================================================
// CORE MODULES (always available)
// ============================================================================

pub mod error;

/// Enclosures, measurements and raw readings
pub mod enclosure;

/// File-per-key persistence for the limits and credential records
pub mod storage;

pub mod limits;
pub mod credentials;

/// Threshold band classification
pub mod classifier;

/// Monotonic per-cycle severity fold
pub mod severity;

pub mod snapshot;
pub mod alarm;
pub mod sensor;

/// Boundaries to hardware, bus and portal
pub mod io;

pub mod config;
pub mod engine;

// ============================================================================
// ADAPTERS (feature-gated)
// ============================================================================

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "portal")]
pub mod portal;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use alarm::{AlarmPolicy, Indicators, SirenChange};
pub use classifier::{classify, Classification};
pub use config::Config;
pub use credentials::{CredentialStore, Credentials};
pub use enclosure::{CycleReadings, Enclosure, Measurement, Reading};
pub use engine::{evaluate, CycleEvaluation, Engine, EngineParts, EngineStats};
pub use error::{ConfigError, ConnectivityError, HabitatError, Result, SensorError};
pub use io::{Actuator, Button, ControlEvent, ControlPanel, ProvisioningPortal, Publisher};
pub use limits::{Band, Limits, LimitsStore, SharedLimits};
pub use sensor::{ReadingSupplier, RetryingSupplier};
pub use severity::{Severity, SeverityRatchet, Status, Trigger};
pub use snapshot::CycleSnapshot;
pub use storage::FileStore;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttHandler, MqttPublisher};

#[cfg(feature = "portal")]
pub use portal::Portal;

#[cfg(feature = "simulation")]
pub use sensor::SimulatedSupplier;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global fmt subscriber. `RUST_LOG` overrides the default
/// `habitat=info` filter. Calling this twice is harmless.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("habitat=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
