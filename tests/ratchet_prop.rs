use habitat::enclosure::FOLD_ORDER;
use habitat::severity::{transition, Report};
use habitat::*;
use proptest::prelude::*;

fn classification() -> impl Strategy<Value = Classification> {
    prop_oneof![
        Just(Classification::IDEAL),
        Just(Classification::WARNING),
        Just(Classification::CRITICAL),
    ]
}

fn reports(classes: &[Classification]) -> Vec<Report> {
    FOLD_ORDER
        .iter()
        .zip(classes)
        .map(|(&(e, m), &c)| Report::new(e, m, c))
        .collect()
}

proptest! {
    #[test]
    fn test_decision_is_worst_classification(classes in prop::collection::vec(classification(), 4)) {
        let mut ratchet = SeverityRatchet::new();
        for report in reports(&classes) {
            ratchet.fold(&report);
        }
        let worst = classes.iter().map(|c| c.severity()).max().unwrap();
        prop_assert_eq!(ratchet.status().decision, worst);
    }

    #[test]
    fn test_never_downgrades(classes in prop::collection::vec(classification(), 4)) {
        let mut status = Status::IDEAL;
        for report in reports(&classes) {
            let next = transition(status, &report);
            prop_assert!(next.decision >= status.decision);
            status = next;
        }
    }

    #[test]
    fn test_context_is_last_report_at_final_tier(classes in prop::collection::vec(classification(), 4)) {
        let all = reports(&classes);
        let mut ratchet = SeverityRatchet::new();
        for report in &all {
            ratchet.fold(report);
        }
        let status = ratchet.status();

        let expected = all
            .iter()
            .rev()
            .find(|r| r.classification.severity() == status.decision && status.decision != Severity::Ideal)
            .map(|r| Trigger { enclosure: r.enclosure, measurement: r.measurement });
        prop_assert_eq!(status.trigger, expected);
    }

    #[test]
    fn test_readings_inside_ideal_band_are_ideal(
        low in 0u16..100, widths in (0u16..20, 0u16..20, 0u16..20), offset in 0.0f32..1.0
    ) {
        let (w1, w2, w3) = widths;
        let band = Band::new(low, low + w1, low + w1 + w2, low + w1 + w2 + w3);
        let value = f32::from(band.ideal_low) + offset * f32::from(w2);
        prop_assert_eq!(classify(value, &band), Classification::IDEAL);
    }
}
