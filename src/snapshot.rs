// src/snapshot.rs - Per-cycle telemetry record and its wire payload
use crate::{
    enclosure::Reading,
    error::Result,
    severity::Status,
};
use serde::{Deserialize, Serialize};

/// Longest decision/enclosure/measurement name carried in the payload.
///
/// Downstream consumers match on the clipped form, so `"temperature"` is
/// published as `"temperatu"`.
pub const DEFAULT_MAX_FIELD_LEN: usize = 9;

/// Wire form of one cycle:
///
/// ```json
/// {"status":{"decision":"critical","enclosure":["avian","temperatu"]},
///  "avian":{"temperature":19.0,"humidity":55.0},
///  "reptilian":{"temperature":30.0,"humidity":40.0}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub status: PayloadStatus,
    pub avian: Reading,
    pub reptilian: Reading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadStatus {
    pub decision: String,
    /// `[enclosure, measurement]` of the trigger, both empty when ideal.
    pub enclosure: [String; 2],
}

/// Accumulates one cycle's readings and decision until it is published.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSnapshot {
    status: Status,
    avian: Reading,
    reptilian: Reading,
    max_field_len: usize,
}

impl Default for CycleSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FIELD_LEN)
    }
}

impl CycleSnapshot {
    pub fn new(max_field_len: usize) -> Self {
        Self {
            status: Status::IDEAL,
            avian: Reading::default(),
            reptilian: Reading::default(),
            max_field_len,
        }
    }

    pub fn set_readings(&mut self, avian: Reading, reptilian: Reading) {
        self.avian = avian;
        self.reptilian = reptilian;
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    fn clip(&self, s: &str) -> String {
        s.chars().take(self.max_field_len).collect()
    }

    pub fn payload(&self) -> Payload {
        let enclosure = match self.status.trigger {
            Some(trigger) => [
                self.clip(trigger.enclosure.as_str()),
                self.clip(trigger.measurement.as_str()),
            ],
            None => [String::new(), String::new()],
        };

        Payload {
            status: PayloadStatus {
                decision: self.clip(self.status.decision.as_str()),
                enclosure,
            },
            avian: self.avian,
            reptilian: self.reptilian,
        }
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.payload())?)
    }

    /// Back to the neutral state: ideal, no context, zero readings.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_field_len);
    }
}
