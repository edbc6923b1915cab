// src/enclosure.rs - Monitored habitats, measured quantities and raw readings
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two monitored habitats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enclosure {
    Avian,
    Reptilian,
}

impl Enclosure {
    pub const ALL: [Enclosure; 2] = [Enclosure::Avian, Enclosure::Reptilian];

    pub fn as_str(&self) -> &'static str {
        match self {
            Enclosure::Avian => "avian",
            Enclosure::Reptilian => "reptilian",
        }
    }
}

impl fmt::Display for Enclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical quantity sampled in each enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Temperature,
    Humidity,
}

impl Measurement {
    pub const ALL: [Measurement; 2] = [Measurement::Temperature, Measurement::Humidity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Temperature => "temperature",
            Measurement::Humidity => "humidity",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which the four reports of a cycle are folded into the ratchet.
///
/// The ratchet keeps the *last* report at the winning severity tier as its
/// diagnostic context, so this order is observable in the published status.
pub const FOLD_ORDER: [(Enclosure, Measurement); 4] = [
    (Enclosure::Avian, Measurement::Temperature),
    (Enclosure::Avian, Measurement::Humidity),
    (Enclosure::Reptilian, Measurement::Temperature),
    (Enclosure::Reptilian, Measurement::Humidity),
];

/// Temperature/humidity pair sampled from one enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
}

impl Reading {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self { temperature, humidity }
    }

    pub fn get(&self, measurement: Measurement) -> f32 {
        match measurement {
            Measurement::Temperature => self.temperature,
            Measurement::Humidity => self.humidity,
        }
    }

    /// A reading is usable once neither value resolved to NaN.
    pub fn is_valid(&self) -> bool {
        !self.temperature.is_nan() && !self.humidity.is_nan()
    }
}

/// The four raw values sampled during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleReadings {
    pub avian: Reading,
    pub reptilian: Reading,
}

impl CycleReadings {
    pub fn new(avian: Reading, reptilian: Reading) -> Self {
        Self { avian, reptilian }
    }

    pub fn enclosure(&self, enclosure: Enclosure) -> &Reading {
        match enclosure {
            Enclosure::Avian => &self.avian,
            Enclosure::Reptilian => &self.reptilian,
        }
    }

    pub fn value(&self, enclosure: Enclosure, measurement: Measurement) -> f32 {
        self.enclosure(enclosure).get(measurement)
    }

    pub fn is_valid(&self) -> bool {
        self.avian.is_valid() && self.reptilian.is_valid()
    }
}
