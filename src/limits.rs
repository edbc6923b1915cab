// src/limits.rs - Four-band threshold configuration and its persisted record
use crate::{
    enclosure::{Enclosure, Measurement},
    error::{ConfigError, Result},
    storage::FileStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Storage key of the persisted limits record.
pub const LIMITS_KEY: &str = "limits.json";

/// Threshold band for one enclosure × measurement pair.
///
/// Persisted as `[low, ideal_low, ideal_high, high]`. The intended ordering
/// `low <= ideal_low <= ideal_high <= high` is not enforced; see
/// [`Band::is_ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u16; 4]", into = "[u16; 4]")]
pub struct Band {
    pub low: u16,
    pub ideal_low: u16,
    pub ideal_high: u16,
    pub high: u16,
}

impl Band {
    pub const fn new(low: u16, ideal_low: u16, ideal_high: u16, high: u16) -> Self {
        Self { low, ideal_low, ideal_high, high }
    }

    pub fn is_ordered(&self) -> bool {
        self.low <= self.ideal_low && self.ideal_low <= self.ideal_high && self.ideal_high <= self.high
    }
}

impl From<[u16; 4]> for Band {
    fn from([low, ideal_low, ideal_high, high]: [u16; 4]) -> Self {
        Self { low, ideal_low, ideal_high, high }
    }
}

impl From<Band> for [u16; 4] {
    fn from(band: Band) -> Self {
        [band.low, band.ideal_low, band.ideal_high, band.high]
    }
}

/// Complete threshold set: one band per enclosure × measurement.
///
/// The serde field names are the keys of the persisted record and of the
/// portal submission body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Limits {
    #[serde(rename = "avian_temp")]
    pub avian_temperature: Band,
    #[serde(rename = "avian_humid")]
    pub avian_humidity: Band,
    #[serde(rename = "rept_temp")]
    pub reptilian_temperature: Band,
    #[serde(rename = "rept_humid")]
    pub reptilian_humidity: Band,
}

impl Limits {
    pub fn band(&self, enclosure: Enclosure, measurement: Measurement) -> &Band {
        match (enclosure, measurement) {
            (Enclosure::Avian, Measurement::Temperature) => &self.avian_temperature,
            (Enclosure::Avian, Measurement::Humidity) => &self.avian_humidity,
            (Enclosure::Reptilian, Measurement::Temperature) => &self.reptilian_temperature,
            (Enclosure::Reptilian, Measurement::Humidity) => &self.reptilian_humidity,
        }
    }

    /// Parse the four-array record. Any shape mismatch is [`ConfigError::Malformed`].
    pub fn from_json(json: &[u8]) -> std::result::Result<Self, ConfigError> {
        serde_json::from_slice(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pairs whose band violates the intended ordering.
    pub fn unordered_bands(&self) -> Vec<(Enclosure, Measurement)> {
        crate::enclosure::FOLD_ORDER
            .into_iter()
            .filter(|&(e, m)| !self.band(e, m).is_ordered())
            .collect()
    }

    fn warn_if_unordered(&self, context: &str) {
        for (enclosure, measurement) in self.unordered_bands() {
            warn!(
                "{} limits for {} {} are out of order: {:?}",
                context,
                enclosure,
                measurement,
                <[u16; 4]>::from(*self.band(enclosure, measurement))
            );
        }
    }
}

/// Limits handle shared between the control loop and the provisioning portal.
pub type SharedLimits = Arc<RwLock<LimitsStore>>;

/// Persisted limits plus the in-memory copy that gates evaluation.
///
/// Evaluation may only run while [`LimitsStore::is_configured`] holds; the
/// flag is raised by [`LimitsStore::apply`] and dropped by
/// [`LimitsStore::invalidate`].
#[derive(Debug)]
pub struct LimitsStore {
    store: FileStore,
    cached: Limits,
    configured: bool,
}

impl LimitsStore {
    pub fn new(store: FileStore) -> Self {
        Self {
            store,
            cached: Limits::default(),
            configured: false,
        }
    }

    pub fn shared(self) -> SharedLimits {
        Arc::new(RwLock::new(self))
    }

    /// Read the persisted record.
    pub fn load(&self) -> std::result::Result<Limits, ConfigError> {
        let json = self
            .store
            .read(LIMITS_KEY)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?
            .ok_or(ConfigError::Missing)?;
        let limits = Limits::from_json(json.as_bytes())?;
        limits.warn_if_unordered("Loaded");
        Ok(limits)
    }

    /// Read the persisted record, degrading a malformed one to all-zero bands.
    ///
    /// All-zero bands classify nearly every reading as critical. The
    /// degradation is kept as-is and only logged.
    pub fn load_or_zeroed(&self) -> std::result::Result<Limits, ConfigError> {
        match self.load() {
            Err(ConfigError::Malformed(reason)) => {
                warn!("Limits record is malformed ({}); falling back to all-zero bands", reason);
                Ok(Limits::default())
            }
            other => other,
        }
    }

    /// Persist the complete threshold set, replacing any prior record.
    pub fn save(&self, limits: &Limits) -> Result<()> {
        limits.warn_if_unordered("Saved");
        self.store.write(LIMITS_KEY, &limits.to_json()?)?;
        info!("Limits record saved");
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.store.exists(LIMITS_KEY)
    }

    /// Delete the persisted record. The cached copy stays until [`invalidate`](Self::invalidate).
    pub fn clear(&self) -> Result<()> {
        if self.store.remove(LIMITS_KEY)? {
            info!("Limits record cleared");
        }
        Ok(())
    }

    /// Install `limits` as the active configuration.
    pub fn apply(&mut self, limits: Limits) {
        self.cached = limits;
        self.configured = true;
    }

    /// Drop the configured flag so evaluation stalls until the next configuration.
    pub fn invalidate(&mut self) {
        self.configured = false;
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Active limits, or `None` while unconfigured.
    pub fn limits(&self) -> Option<&Limits> {
        self.configured.then_some(&self.cached)
    }
}
