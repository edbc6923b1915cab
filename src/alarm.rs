// src/alarm.rs - Indicator states and siren policy
//
// Indicators follow every cycle. The siren is edge-triggered: it rises when an
// enclosure goes critical and falls only once both are ideal again, or when an
// operator silences it while nothing is critical.

use crate::{classifier::Classification, severity::Severity};
use tracing::{info, warn};

/// Indicator state of one enclosure: the worse of its two classifications.
pub fn enclosure_state(temperature: Classification, humidity: Classification) -> Severity {
    temperature.severity().max(humidity.severity())
}

/// What each enclosure's indicator shows for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indicators {
    pub avian: Severity,
    pub reptilian: Severity,
}

impl Indicators {
    pub fn new(avian: Severity, reptilian: Severity) -> Self {
        Self { avian, reptilian }
    }

    pub fn any_critical(&self) -> bool {
        self.avian == Severity::Critical || self.reptilian == Severity::Critical
    }

    pub fn all_ideal(&self) -> bool {
        self.avian == Severity::Ideal && self.reptilian == Severity::Ideal
    }
}

/// Siren edge produced by an evaluation or operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenChange {
    Unchanged,
    Activated,
    /// The siren went off; the bus is told with a reset message.
    Silenced,
}

#[derive(Debug, Default)]
pub struct AlarmPolicy {
    siren_on: bool,
    indicators: Option<Indicators>,
}

impl AlarmPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn siren_on(&self) -> bool {
        self.siren_on
    }

    /// Indicators of the last evaluated cycle, `None` while dark.
    pub fn indicators(&self) -> Option<Indicators> {
        self.indicators
    }

    /// Apply one cycle's indicator states. The decision uses the siren state
    /// from before this call, so at most one edge happens per cycle.
    pub fn evaluate(&mut self, indicators: Indicators) -> SirenChange {
        self.indicators = Some(indicators);

        if self.siren_on && indicators.all_ideal() {
            self.siren_on = false;
            info!("Both enclosures ideal, siren off");
            SirenChange::Silenced
        } else if !self.siren_on && indicators.any_critical() {
            self.siren_on = true;
            warn!(
                "Critical enclosure condition (avian {}, reptilian {}), siren on",
                indicators.avian, indicators.reptilian
            );
            SirenChange::Activated
        } else {
            SirenChange::Unchanged
        }
    }

    /// Operator stop request. Refused while any enclosure is still critical.
    pub fn request_silence(&mut self) -> SirenChange {
        if !self.siren_on {
            return SirenChange::Unchanged;
        }
        if self.indicators.is_some_and(|i| i.any_critical()) {
            warn!("Siren stop refused: an enclosure is still critical");
            return SirenChange::Unchanged;
        }
        self.siren_on = false;
        info!("Siren silenced by operator");
        SirenChange::Silenced
    }

    /// Remote activation. Stays on until the normal clearing rules apply.
    pub fn force_on(&mut self) -> SirenChange {
        if self.siren_on {
            return SirenChange::Unchanged;
        }
        self.siren_on = true;
        warn!("Siren forced on by remote command");
        SirenChange::Activated
    }

    /// All outputs off, used when the device drops back to provisioning.
    pub fn darken(&mut self) -> SirenChange {
        self.indicators = None;
        if self.siren_on {
            self.siren_on = false;
            SirenChange::Silenced
        } else {
            SirenChange::Unchanged
        }
    }
}
