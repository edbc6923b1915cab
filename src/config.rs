// src/config.rs - Process configuration loaded from YAML

use crate::error::{HabitatError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

/// Main HABITAT configuration. Every section is optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Control loop timing
    #[serde(default)]
    pub engine: EngineConfig,

    /// Where persisted records live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Message bus session
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Limits provisioning server
    #[serde(default)]
    pub portal: PortalConfig,

    /// Outbound telemetry formatting
    #[serde(default)]
    pub payload: PayloadConfig,

    /// Sensor retry policy
    #[serde(default)]
    pub sensor: SensorConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HabitatError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate. A blank document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        for (name, value) in [
            ("sample_interval_ms", engine.sample_interval_ms),
            ("housekeeping_interval_ms", engine.housekeeping_interval_ms),
            ("unconfigured_poll_ms", engine.unconfigured_poll_ms),
        ] {
            if value == 0 {
                return Err(HabitatError::Config(format!("engine.{} must be greater than zero", name)));
            }
        }

        if self.mqtt.broker_host.is_empty() {
            return Err(HabitatError::Config("mqtt.broker_host must not be empty".into()));
        }
        if self.mqtt.client_id.is_empty() {
            return Err(HabitatError::Config("mqtt.client_id must not be empty".into()));
        }
        let topics = &self.mqtt.topics;
        for (name, topic) in [
            ("readings", &topics.readings),
            ("siren", &topics.siren),
            ("siren_off", &topics.siren_off),
        ] {
            if topic.is_empty() || topic.contains(['+', '#']) {
                return Err(HabitatError::Config(format!(
                    "mqtt.topics.{} '{}' is not a valid publish topic",
                    name, topic
                )));
            }
        }

        if self.payload.max_field_len == 0 {
            return Err(HabitatError::Config("payload.max_field_len must be greater than zero".into()));
        }
        if self.sensor.max_attempts == Some(0) {
            return Err(HabitatError::Config("sensor.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the sampling cycle
    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,

    /// Period of bus and button servicing
    #[serde(default = "default_housekeeping_interval")]
    pub housekeeping_interval_ms: u64,

    /// How often an unconfigured device checks for a limits record
    #[serde(default = "default_unconfigured_poll")]
    pub unconfigured_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval(),
            housekeeping_interval_ms: default_housekeeping_interval(),
            unconfigured_poll_ms: default_unconfigured_poll(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub broker_host: String,
    #[serde(default = "default_mqtt_port")]
    pub broker_port: u16,
    /// Prefix of the session identity; a millisecond timestamp is appended
    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_mqtt_keepalive")]
    pub keepalive_secs: u64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    #[serde(default)]
    pub topics: TopicConfig,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: default_mqtt_host(),
            broker_port: default_mqtt_port(),
            client_id: default_mqtt_client_id(),
            username: None,
            password: None,
            keepalive_secs: default_mqtt_keepalive(),
            reconnect_delay_ms: default_reconnect_delay(),
            topics: TopicConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Per-cycle snapshot
    #[serde(default = "default_readings_topic")]
    pub readings: String,
    /// Inbound remote siren commands
    #[serde(default = "default_siren_topic")]
    pub siren: String,
    /// Outbound notice that the siren went off
    #[serde(default = "default_siren_off_topic")]
    pub siren_off: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            readings: default_readings_topic(),
            siren: default_siren_topic(),
            siren_off: default_siren_off_topic(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_portal_bind")]
    pub bind_address: SocketAddr,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self { bind_address: default_portal_bind() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadConfig {
    #[serde(default = "default_max_field_len")]
    pub max_field_len: usize,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self { max_field_len: default_max_field_len() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Pause between failed reads; zero retries immediately
    #[serde(default = "default_sensor_retry_delay")]
    pub retry_delay_ms: u64,
    /// Give up after this many reads; unbounded when absent
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_sensor_retry_delay(),
            max_attempts: None,
        }
    }
}

// ============================================================================
// DEFAULT VALUE FUNCTIONS
// ============================================================================

fn default_sample_interval() -> u64 { 15_000 }
fn default_housekeeping_interval() -> u64 { 1_000 }
fn default_unconfigured_poll() -> u64 { 3_500 }
fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
fn default_mqtt_host() -> String { "localhost".to_string() }
fn default_mqtt_port() -> u16 { 1883 }
fn default_mqtt_client_id() -> String { "habitat".to_string() }
fn default_mqtt_keepalive() -> u64 { 30 }
fn default_reconnect_delay() -> u64 { 5_000 }
fn default_readings_topic() -> String { "readings".to_string() }
fn default_siren_topic() -> String { "siren".to_string() }
fn default_siren_off_topic() -> String { "/siren/off".to_string() }
fn default_portal_bind() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 8080)) }
fn default_sensor_retry_delay() -> u64 { 2_000 }
fn default_max_field_len() -> usize { crate::snapshot::DEFAULT_MAX_FIELD_LEN }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.engine.sample_interval_ms, 15_000);
        assert_eq!(config.engine.housekeeping_interval_ms, 1_000);
        assert_eq!(config.engine.unconfigured_poll_ms, 3_500);
        assert_eq!(config.mqtt.reconnect_delay_ms, 5_000);
        assert_eq!(config.mqtt.topics.siren_off, "/siren/off");
        assert_eq!(config.payload.max_field_len, 9);
        assert_eq!(config.sensor.max_attempts, None);
        assert_eq!(config.sensor.retry_delay_ms, 2_000);
        assert_eq!(config.portal.bind_address.port(), 8080);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
engine:
  sample_interval_ms: 2000
mqtt:
  broker_host: broker.local
  username: keeper
  topics:
    readings: zoo/readings
sensor:
  max_attempts: 5
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.engine.sample_interval_ms, 2000);
        assert_eq!(config.engine.housekeeping_interval_ms, 1_000);
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.username.as_deref(), Some("keeper"));
        assert_eq!(config.mqtt.topics.readings, "zoo/readings");
        assert_eq!(config.mqtt.topics.siren, "siren");
        assert_eq!(config.sensor.max_attempts, Some(5));
    }

    #[test]
    fn test_validation_failures() {
        for yaml in [
            "engine:\n  sample_interval_ms: 0\n",
            "mqtt:\n  broker_host: ''\n",
            "mqtt:\n  topics:\n    readings: 'zoo/#'\n",
            "payload:\n  max_field_len: 0\n",
            "sensor:\n  max_attempts: 0\n",
        ] {
            assert!(
                matches!(Config::from_yaml(yaml), Err(HabitatError::Config(_))),
                "accepted {:?}",
                yaml
            );
        }
    }

    #[test]
    fn test_syntax_error_is_yaml_error() {
        assert!(matches!(
            Config::from_yaml("engine: [unclosed"),
            Err(HabitatError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "portal:\n  bind_address: 127.0.0.1:9000").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.portal.bind_address, "127.0.0.1:9000".parse().unwrap());

        assert!(Config::from_file("/nonexistent/habitat.yaml").is_err());
    }
}
