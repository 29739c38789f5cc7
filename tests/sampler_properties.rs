// tests/sampler_properties.rs
//
// Property tests for single draws: range and membership hold for any valid
// parameters and any seed.

use proptest::prelude::*;

use tanzo_sim::rng::seeded;
use tanzo_sim::{sample, Distribution, Scalar};

proptest! {
    #[test]
    fn uniform_draws_stay_in_range(
        seed in any::<u64>(),
        min in -1.0e6_f64..1.0e6,
        width in 1.0e-6_f64..1.0e6,
    ) {
        let max = min + width;
        prop_assume!(max > min);
        let d = Distribution::uniform(min, max).unwrap();
        let mut rng = seeded(seed);
        for _ in 0..64 {
            let x = sample(&d, &mut rng).unwrap().as_number().unwrap();
            prop_assert!(x >= min && x < max, "x = {} not in [{}, {})", x, min, max);
        }
    }

    #[test]
    fn normal_draws_are_finite(
        seed in any::<u64>(),
        mean in -1.0e3_f64..1.0e3,
        std_dev in 1.0e-3_f64..1.0e3,
    ) {
        let d = Distribution::normal(mean, std_dev).unwrap();
        let mut rng = seeded(seed);
        for _ in 0..64 {
            let x = sample(&d, &mut rng).unwrap().as_number().unwrap();
            prop_assert!(x.is_finite());
        }
    }

    #[test]
    fn discrete_draws_only_positive_weight_values(
        seed in any::<u64>(),
        weights in prop::collection::vec(prop_oneof![Just(0.0_f64), 0.01_f64..=1.0], 1..8),
    ) {
        prop_assume!(weights.iter().any(|&w| w > 0.0));
        let values: Vec<Scalar> = (0..weights.len()).map(|i| Scalar::from(format!("v{i}"))).collect();
        let d = Distribution::discrete(values.clone(), weights.clone()).unwrap();
        let mut rng = seeded(seed);
        for _ in 0..64 {
            let drawn = sample(&d, &mut rng).unwrap();
            let idx = values.iter().position(|v| *v == drawn).unwrap();
            prop_assert!(weights[idx] > 0.0);
        }
    }

    #[test]
    fn same_seed_same_draws(seed in any::<u64>()) {
        let d = Distribution::normal(0.0, 1.0).unwrap();
        let mut a = seeded(seed);
        let mut b = seeded(seed);
        for _ in 0..16 {
            prop_assert_eq!(sample(&d, &mut a).unwrap(), sample(&d, &mut b).unwrap());
        }
    }
}
