// src/classifier.rs - Band classification of a single reading
use crate::{limits::Band, severity::Severity};

/// Outcome of classifying one reading against its band.
///
/// The ratchet's transition rule reads both flags; use [`Classification::severity`]
/// for the collapsed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub warning: bool,
    pub critical: bool,
}

impl Classification {
    pub const IDEAL: Self = Self { warning: false, critical: false };
    pub const WARNING: Self = Self { warning: true, critical: false };
    pub const CRITICAL: Self = Self { warning: false, critical: true };

    /// Critical dominates warning dominates ideal.
    pub fn severity(&self) -> Severity {
        if self.critical {
            Severity::Critical
        } else if self.warning {
            Severity::Warning
        } else {
            Severity::Ideal
        }
    }
}

/// Classify `value` against `band`.
///
/// ```text
/// warning  = (value <  ideal_low  && value >= low)
///         || (value >  ideal_high && value <= high)
/// critical = value < low || value > high
/// ```
///
/// `low` and `high` themselves are warning, `ideal_low` and `ideal_high`
/// themselves are ideal. NaN satisfies no comparison and classifies as ideal;
/// suppliers must not hand NaN to the core.
pub fn classify(value: f32, band: &Band) -> Classification {
    let low = f32::from(band.low);
    let ideal_low = f32::from(band.ideal_low);
    let ideal_high = f32::from(band.ideal_high);
    let high = f32::from(band.high);

    Classification {
        warning: (value < ideal_low && value >= low) || (value > ideal_high && value <= high),
        critical: value < low || value > high,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAND: Band = Band::new(20, 22, 28, 32);

    #[test]
    fn test_boundaries() {
        let cases = [
            (19.9, Severity::Critical),
            (20.0, Severity::Warning),
            (21.9, Severity::Warning),
            (22.0, Severity::Ideal),
            (25.0, Severity::Ideal),
            (28.0, Severity::Ideal),
            (28.1, Severity::Warning),
            (32.0, Severity::Warning),
            (32.1, Severity::Critical),
        ];
        for (value, expected) in cases {
            assert_eq!(classify(value, &BAND).severity(), expected, "value {}", value);
        }
    }

    #[test]
    fn test_flags_are_exclusive_for_ordered_band() {
        for tenth in 0..500 {
            let value = tenth as f32 / 10.0;
            let c = classify(value, &BAND);
            assert!(!(c.warning && c.critical), "value {}", value);
        }
    }

    #[test]
    fn test_zero_band_is_critical_above_zero() {
        let zero = Band::default();
        assert_eq!(classify(0.0, &zero), Classification::IDEAL);
        assert_eq!(classify(0.1, &zero), Classification::CRITICAL);
        assert_eq!(classify(23.0, &zero), Classification::CRITICAL);
    }

    #[test]
    fn test_unordered_band_can_raise_both_flags() {
        // low above ideal_high: a value between them is both below low and above ideal_high
        let band = Band::new(30, 5, 10, 40);
        let c = classify(20.0, &band);
        assert!(c.warning && c.critical);
        assert_eq!(c.severity(), Severity::Critical);
    }

    #[test]
    fn test_nan_is_ideal() {
        assert_eq!(classify(f32::NAN, &BAND), Classification::IDEAL);
    }
}
