//! Property tests over the engine invariants.

use proptest::prelude::*;
use walk_core::real::{one, real, to_f64, zero, Real};
use walk_engines::cdf::{TimeCdfConfig, TimeCdfEngine};
use walk_engines::occupancy::{OccupancyConfig, OccupancyEngine};

fn time_engine(beta: f64, t_max: usize, seed: u64) -> TimeCdfEngine {
    let config = TimeCdfConfig::builder()
        .beta(beta)
        .t_max(t_max)
        .seed(seed)
        .build()
        .unwrap();
    TimeCdfEngine::new(config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_slot_zero_pinned_for_any_shape_and_seed(
        beta in 0.05_f64..4.0,
        seed in any::<u64>(),
    ) {
        let mut engine = time_engine(beta, 15, seed);
        for _ in 0..15 {
            engine.advance().unwrap();
            prop_assert_eq!(engine.cdf()[0].clone(), one());
        }
    }

    #[test]
    fn prop_prefix_is_monotone_non_increasing(
        beta in 0.05_f64..4.0,
        seed in any::<u64>(),
    ) {
        let mut engine = time_engine(beta, 20, seed);
        for _ in 0..20 {
            engine.advance().unwrap();
        }
        let cdf = engine.cdf();
        for pair in cdf.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn prop_same_seed_reproduces_evolution(
        beta in 0.05_f64..4.0,
        seed in any::<u64>(),
    ) {
        let mut a = time_engine(beta, 12, seed);
        let mut b = time_engine(beta, 12, seed);
        for _ in 0..12 {
            a.advance().unwrap();
            b.advance().unwrap();
        }
        prop_assert_eq!(a.cdf(), b.cdf());
    }

    #[test]
    fn prop_combined_scan_equals_individual_scans(
        seed in any::<u64>(),
        quantiles in proptest::collection::vec(1.5_f64..1e12, 1..6),
    ) {
        let mut engine = time_engine(1.0, 25, seed);
        for _ in 0..25 {
            engine.advance().unwrap();
        }
        let qs: Vec<Real> = quantiles.iter().map(|&q| real(q)).collect();
        let combined = engine.find_quantiles(&qs).unwrap();
        for (q, expected) in qs.iter().zip(combined.iter()) {
            prop_assert_eq!(engine.find_quantile(q).unwrap(), *expected);
        }
    }

    #[test]
    fn prop_discrete_occupancy_conserves_mass(
        n_particles in 1.0_f64..100_000.0,
        seed in any::<u64>(),
        static_environment in any::<bool>(),
    ) {
        let n_particles = n_particles.floor();
        let config = OccupancyConfig::builder()
            .n_particles(n_particles)
            .beta(1.0)
            .occupancy_size(20)
            .static_environment(static_environment)
            .seed(seed)
            .build()
            .unwrap();
        let mut engine = OccupancyEngine::new(config).unwrap();
        for _ in 0..15 {
            engine.advance().unwrap();
            let total = engine
                .occupancy()
                .iter()
                .fold(zero(), |acc, v| acc + v);
            prop_assert_eq!(total, real(n_particles));
        }
    }

    #[test]
    fn prop_continuous_occupancy_conserves_mass(
        exponent in 65.0_f64..75.0,
        seed in any::<u64>(),
    ) {
        // Counts above the default large cutoff take the deterministic
        // expectation path.
        let n_particles = 10.0_f64.powf(exponent);
        let config = OccupancyConfig::builder()
            .n_particles(n_particles)
            .beta(1.0)
            .occupancy_size(20)
            .seed(seed)
            .build()
            .unwrap();
        let mut engine = OccupancyEngine::new(config).unwrap();
        for _ in 0..15 {
            engine.advance().unwrap();
        }
        let total = engine
            .occupancy()
            .iter()
            .fold(zero(), |acc, v| acc + v);
        let relative = (to_f64(&total) - n_particles).abs() / n_particles;
        prop_assert!(relative < 1e-10);
    }

    #[test]
    fn prop_occupancy_edges_nested_within_allocation(
        seed in any::<u64>(),
    ) {
        let config = OccupancyConfig::builder()
            .n_particles(1000.0)
            .beta(1.0)
            .occupancy_size(30)
            .seed(seed)
            .build()
            .unwrap();
        let mut engine = OccupancyEngine::new(config).unwrap();
        for _ in 0..20 {
            engine.advance().unwrap();
            prop_assert!(engine.min_idx() <= engine.max_idx());
            prop_assert!(engine.max_idx() <= engine.time());
        }
    }
}
