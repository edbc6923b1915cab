// src/severity.rs - Per-cycle severity ratchet
//
// Four classifier reports are folded, in FOLD_ORDER, into one Status. The fold
// never downgrades and records the last report that matched the current tier.

use crate::{
    classifier::Classification,
    enclosure::{Enclosure, Measurement},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Ordinal severity of a classification or of a whole cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ideal = 0,
    Warning = 1,
    Critical = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ideal => "ideal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The enclosure/measurement pair that produced a non-ideal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub enclosure: Enclosure,
    pub measurement: Measurement,
}

/// Decision of a cycle plus its diagnostic context.
///
/// `trigger` is `None` exactly when `decision` is [`Severity::Ideal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub decision: Severity,
    pub trigger: Option<Trigger>,
}

impl Status {
    pub const IDEAL: Status = Status {
        decision: Severity::Ideal,
        trigger: None,
    };

    fn triggered(decision: Severity, report: &Report) -> Self {
        Self {
            decision,
            trigger: Some(Trigger {
                enclosure: report.enclosure,
                measurement: report.measurement,
            }),
        }
    }
}

/// One classifier output, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub enclosure: Enclosure,
    pub measurement: Measurement,
    pub classification: Classification,
}

impl Report {
    pub fn new(enclosure: Enclosure, measurement: Measurement, classification: Classification) -> Self {
        Self { enclosure, measurement, classification }
    }
}

/// Next ratchet state after folding `report` into `state`.
///
/// * ideal report while still ideal: stays ideal, context cleared
/// * warning report while at most warning: warning, context overwritten
/// * critical report at any severity: critical, context overwritten
/// * anything else is a no-op, so a cycle never downgrades
pub fn transition(state: Status, report: &Report) -> Status {
    let Classification { warning, critical } = report.classification;

    if !warning && !critical && state.decision == Severity::Ideal {
        Status::IDEAL
    } else if warning && !critical && state.decision <= Severity::Warning {
        Status::triggered(Severity::Warning, report)
    } else if critical {
        Status::triggered(Severity::Critical, report)
    } else {
        state
    }
}

/// Fold state for one sampling cycle. Start a fresh one (or [`reset`](Self::reset)) per cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityRatchet {
    status: Status,
}

impl SeverityRatchet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, report: &Report) -> Status {
        let next = transition(self.status, report);
        if next != self.status {
            debug!(
                "{} {} is {}; cycle status {} -> {}",
                report.enclosure,
                report.measurement,
                report.classification.severity(),
                self.status.decision,
                next.decision
            );
        }
        self.status = next;
        next
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn reset(&mut self) {
        self.status = Status::IDEAL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclosure::FOLD_ORDER;

    fn fold_all(classes: [Classification; 4]) -> Status {
        let mut ratchet = SeverityRatchet::new();
        for ((enclosure, measurement), classification) in FOLD_ORDER.into_iter().zip(classes) {
            ratchet.fold(&Report::new(enclosure, measurement, classification));
        }
        ratchet.status()
    }

    const I: Classification = Classification::IDEAL;
    const W: Classification = Classification::WARNING;
    const C: Classification = Classification::CRITICAL;

    #[test]
    fn test_all_ideal() {
        assert_eq!(fold_all([I, I, I, I]), Status::IDEAL);
    }

    #[test]
    fn test_critical_then_ideal_does_not_revert() {
        let status = fold_all([C, I, I, I]);
        assert_eq!(status.decision, Severity::Critical);
        assert_eq!(
            status.trigger,
            Some(Trigger {
                enclosure: Enclosure::Avian,
                measurement: Measurement::Temperature
            })
        );
    }

    #[test]
    fn test_last_warning_wins_context() {
        let status = fold_all([W, I, W, I]);
        assert_eq!(status.decision, Severity::Warning);
        assert_eq!(
            status.trigger,
            Some(Trigger {
                enclosure: Enclosure::Reptilian,
                measurement: Measurement::Temperature
            })
        );
    }

    #[test]
    fn test_warning_after_critical_keeps_critical_context() {
        let status = fold_all([I, C, W, W]);
        assert_eq!(status.decision, Severity::Critical);
        assert_eq!(status.trigger.map(|t| t.measurement), Some(Measurement::Humidity));
        assert_eq!(status.trigger.map(|t| t.enclosure), Some(Enclosure::Avian));
    }

    #[test]
    fn test_last_critical_wins_context() {
        let status = fold_all([C, W, I, C]);
        assert_eq!(
            status.trigger,
            Some(Trigger {
                enclosure: Enclosure::Reptilian,
                measurement: Measurement::Humidity
            })
        );
    }

    #[test]
    fn test_both_flags_escalate_to_critical() {
        let both = Classification { warning: true, critical: true };
        let status = transition(Status::IDEAL, &Report::new(Enclosure::Avian, Measurement::Humidity, both));
        assert_eq!(status.decision, Severity::Critical);
    }

    #[test]
    fn test_reset() {
        let mut ratchet = SeverityRatchet::new();
        ratchet.fold(&Report::new(Enclosure::Avian, Measurement::Temperature, C));
        ratchet.reset();
        assert_eq!(ratchet.status(), Status::IDEAL);
    }

    #[test]
    fn test_severity_order_and_names() {
        assert!(Severity::Ideal < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}
