//! Property tests: the governor's dampers stay in range and the SCRAM
//! latch never releases.

use maat_reactor::{DamperKind, Governor, GovernorConfig, ScramLimits, Telemetry};
use proptest::prelude::*;

fn arb_telemetry() -> impl Strategy<Value = Telemetry> {
    prop_oneof![
        3 => (0.0f64..3.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(
            |(criticality, temperature, pressure, reality)| Telemetry {
                criticality,
                temperature,
                pressure,
                reality,
            }
        ),
        1 => Just(Telemetry {
            criticality: 1.0,
            temperature: 0.1,
            pressure: 0.1,
            reality: 1.0,
        }),
    ]
}

proptest! {
    #[test]
    fn dampers_stay_within_unit_range(readings in prop::collection::vec(arb_telemetry(), 1..80)) {
        let mut governor = Governor::new(
            GovernorConfig::default(),
            ScramLimits { enabled: false, ..ScramLimits::default() },
        );
        for t in &readings {
            governor.adjust(t);
            for kind in DamperKind::ALL {
                let depth = governor.dampers().depth(kind);
                prop_assert!((0.0..=1.0).contains(&depth));
            }
        }
    }

    #[test]
    fn latch_is_permanent(readings in prop::collection::vec(arb_telemetry(), 1..80)) {
        let mut governor = Governor::new(GovernorConfig::default(), ScramLimits::default());
        let mut first = None;
        for t in &readings {
            let adjustments = governor.adjust(t);
            let reason = governor.check_scram(t);
            match first {
                None => first = reason,
                Some(latched) => {
                    prop_assert!(adjustments.is_empty());
                    prop_assert_eq!(reason, Some(latched));
                }
            }
            if first.is_some() {
                prop_assert!(governor.is_latched());
                prop_assert!(governor.dampers().all_fully_inserted());
            }
        }
    }
}
