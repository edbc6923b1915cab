use thiserror::Error;

/// Failure to obtain the persisted limits record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No limits record has been persisted yet
    #[error("limits record is missing")]
    Missing,

    /// The record exists but does not have the four-band shape
    #[error("limits record is malformed: {0}")]
    Malformed(String),
}

/// Failure reported by a reading supplier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// A sensor resolved to not-a-number
    #[error("sensor returned an invalid reading")]
    Invalid,

    /// The sensor could not be read at all
    #[error("sensor unavailable: {0}")]
    Unavailable(String),

    /// A bounded retry policy ran out of attempts
    #[error("no valid reading after {0} attempts")]
    Exhausted(u32),
}

/// Transient network or message-bus failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The bus session could not be established or was lost
    #[error("bus connection failed: {0}")]
    Bus(String),

    /// A message could not be handed to the bus client
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Application level error type used throughout the crate.
#[derive(Error, Debug)]
pub enum HabitatError {
    /// I/O related failure
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or inconsistent process configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error while encoding or decoding JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Limits record could not be obtained
    #[error(transparent)]
    Limits(#[from] ConfigError),

    /// Reading supplier failure
    #[error(transparent)]
    Sensor(#[from] SensorError),

    /// Network or bus failure
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    /// Evaluation was requested before any limits were configured
    #[error("limits are not configured")]
    NotConfigured,
}

/// Convenient alias over [`Result`] using [`HabitatError`]
pub type Result<T> = std::result::Result<T, HabitatError>;
