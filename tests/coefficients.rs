use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use multilevel_decomp::coefficients::{BaselineMode, CoefficientTable, TableSettings};
use multilevel_decomp::error::DecompError;

fn scenario_table() -> CoefficientTable {
    CoefficientTable::from_levels(vec![vec![(0.0, 5.0)], vec![(1.0, 1.0), (-1.0, 1.0)]]).unwrap()
}

fn assert_same_table(a: &CoefficientTable, b: &CoefficientTable) {
    assert_eq!(a.n_contributors(), b.n_contributors());
    for (la, lb) in a.levels().zip(b.levels()) {
        for (ca, cb) in la.iter().zip(lb.iter()) {
            assert_abs_diff_eq!(ca.mean(), cb.mean(), epsilon = 1e-12);
            assert_abs_diff_eq!(ca.sigma(), cb.sigma(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_from_levels_keeps_literal_values() {
    let table = scenario_table();

    assert_eq!(table.n_levels(), 2);
    assert_eq!(table.n_contributors(), vec![1, 2]);

    let c = table.level(1).and_then(|l| l.get(1)).unwrap();
    assert_eq!(c.mean(), -1.0);
    assert_eq!(c.sigma(), 1.0);
    assert!(table.level(2).is_none());
}

#[test]
fn test_from_levels_rejects_empty_table_and_level() {
    assert!(matches!(
        CoefficientTable::from_levels(vec![]),
        Err(DecompError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        CoefficientTable::from_levels(vec![vec![(0.0, 1.0)], vec![]]),
        Err(DecompError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_from_levels_rejects_bad_sigma() {
    let zero = CoefficientTable::from_levels(vec![vec![(0.0, 1.0)], vec![(1.0, 0.0), (2.0, 1.0)]]);
    assert_eq!(
        zero,
        Err(DecompError::NumericDegeneracy {
            level: 1,
            contributor: 0
        })
    );

    let negative = CoefficientTable::from_levels(vec![vec![(0.0, -2.0)]]);
    assert!(matches!(
        negative,
        Err(DecompError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_aligned_zero_sum_per_level() {
    let table = CoefficientTable::from_levels(vec![
        vec![(3.0, 1.0)],
        vec![(1.0, 0.5), (2.0, 1.5), (6.0, 2.0)],
        vec![(-4.0, 1.0), (10.0, 3.0)],
    ])
    .unwrap();
    let aligned = table.aligned();

    assert!(!table.is_aligned(1e-9));
    assert!(aligned.is_aligned(1e-9));

    // A singular level is shifted to zero
    assert_abs_diff_eq!(aligned.level(0).unwrap().get(0).unwrap().mean(), 0.0);

    let level = aligned.level(1).unwrap();
    let means: Vec<f64> = level.iter().map(|c| c.mean()).collect();
    assert_abs_diff_eq!(means[0], -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(means[1], -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(means[2], 3.0, epsilon = 1e-12);

    // Standard deviations pass through
    let sigmas: Vec<f64> = level.iter().map(|c| c.sigma()).collect();
    assert_eq!(sigmas, vec![0.5, 1.5, 2.0]);
}

#[test]
fn test_aligned_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..10 {
        let settings = TableSettings::new(vec![1, 4, 7, 2], 3.0, 0.5).with_align(false);
        let table = CoefficientTable::sample(&settings, &mut rng).unwrap();

        let once = table.aligned();
        let twice = once.aligned();

        assert!(once.is_aligned(1e-9));
        assert_same_table(&once, &twice);
    }
}

#[test]
fn test_sample_shape_and_positive_sigma() {
    let mut rng = StdRng::seed_from_u64(3);
    let settings = TableSettings::new(vec![1, 3, 5], 0.0, -1.0);
    let table = CoefficientTable::sample(&settings, &mut rng).unwrap();

    assert_eq!(table.n_contributors(), vec![1, 3, 5]);
    assert!(table.is_aligned(1e-9));
    for level in table.levels() {
        assert!(level.iter().all(|c| c.sigma() > 0.0 && c.sigma().is_finite()));
    }
}

#[test]
fn test_sample_unaligned_mode() {
    let mut rng = StdRng::seed_from_u64(5);
    let settings = TableSettings::new(vec![1, 3], 5.0, 0.0).with_align(false);
    let table = CoefficientTable::sample(&settings, &mut rng).unwrap();

    // Means are centered on 5 so the unaligned table is far from zero-sum
    assert!(!table.is_aligned(1e-9));
    assert!(table.aligned().is_aligned(1e-9));
}

#[test]
fn test_sample_same_seed_same_table() {
    let settings = TableSettings::new(vec![1, 2, 3], 1.0, 0.0);
    let a = CoefficientTable::sample(&settings, &mut StdRng::seed_from_u64(9)).unwrap();
    let b = CoefficientTable::sample(&settings, &mut StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_sample_hyperparameters() {
    let mut rng = StdRng::seed_from_u64(17);
    let settings = TableSettings::new(vec![4000], 2.0, 0.5)
        .with_baseline(BaselineMode::Relaxed)
        .with_align(false);
    let table = CoefficientTable::sample(&settings, &mut rng).unwrap();
    let level = table.level(0).unwrap();

    // Means ~ Normal(2, 1), log sigmas ~ Normal(0.5, 1)
    assert_abs_diff_eq!(level.mean_of_means(), 2.0, epsilon = 0.1);
    let log_sigma_mean =
        level.iter().map(|c| c.sigma().ln()).sum::<f64>() / level.len() as f64;
    assert_abs_diff_eq!(log_sigma_mean, 0.5, epsilon = 0.1);
}

#[test]
fn test_sample_strict_baseline() {
    let mut rng = StdRng::seed_from_u64(0);
    let strict = TableSettings::new(vec![2, 3], 0.0, 0.0);
    assert!(matches!(
        CoefficientTable::sample(&strict, &mut rng),
        Err(DecompError::InvalidConfiguration(_))
    ));

    let relaxed = strict.with_baseline(BaselineMode::Relaxed);
    let table = CoefficientTable::sample(&relaxed, &mut rng).unwrap();
    assert_eq!(table.n_contributors(), vec![2, 3]);
}

#[test]
fn test_sample_rejects_bad_settings() {
    let mut rng = StdRng::seed_from_u64(0);

    let empty = TableSettings::new(vec![], 0.0, 0.0);
    assert!(matches!(
        CoefficientTable::sample(&empty, &mut rng),
        Err(DecompError::InvalidConfiguration(_))
    ));

    let zero_count = TableSettings::new(vec![1, 0, 2], 0.0, 0.0);
    assert!(matches!(
        CoefficientTable::sample(&zero_count, &mut rng),
        Err(DecompError::InvalidConfiguration(_))
    ));

    let nan_avg = TableSettings::new(vec![1, 2], f64::NAN, 0.0);
    assert!(matches!(
        CoefficientTable::sample(&nan_avg, &mut rng),
        Err(DecompError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_expected_moments() {
    let table = scenario_table();

    assert_abs_diff_eq!(table.expected_mean(), 0.0, epsilon = 1e-12);
    // 5^2 from the baseline plus (1 + 1) from the two-component mixture
    assert_abs_diff_eq!(table.expected_variance(), 27.0, epsilon = 1e-12);
}

#[test]
fn test_display_lists_levels() {
    let rendered = scenario_table().to_string();
    assert!(rendered.contains("level 0:"));
    assert!(rendered.contains("level 1:"));
    assert_eq!(rendered.lines().count(), 2);
}

#[test]
fn test_aligned_stays_finite_for_large_means() {
    let table =
        CoefficientTable::from_levels(vec![vec![(0.0, 1.0)], vec![(1e308, 1.0), (1e308, 1.0)]])
            .unwrap();
    let aligned = table.aligned();

    assert!(aligned.is_aligned(1e-9));
    for level in aligned.levels() {
        assert!(level.iter().all(|c| c.mean().is_finite()));
    }
    assert_eq!(aligned.level(1).unwrap().get(0).unwrap().mean(), 0.0);
}

#[test]
fn test_large_means_average_without_overflow() {
    let table = CoefficientTable::from_levels(vec![vec![(1.5e308, 1.0), (1.7e308, 1.0)]]).unwrap();
    let avg = table.level(0).unwrap().mean_of_means();

    assert!(avg.is_finite());
    assert_abs_diff_eq!(avg / 1e308, 1.6, epsilon = 1e-12);
}

#[test]
fn test_from_levels_rejects_overflowing_spread() {
    let result = CoefficientTable::from_levels(vec![vec![(1.7e308, 1.0), (-1.7e308, 1.0)]]);
    assert!(matches!(result, Err(DecompError::InvalidConfiguration(_))));
}
