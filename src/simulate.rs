use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Distribution;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::EstimateError,
    estimator::{Estimate, Estimator},
    statistics::log_normal_from_median,
    unit::Unit,
};

const PROGRESS_EVERY: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct SimulatedPercentile {
    pub label: &'static str,
    pub level: f64,
    /// Value from the estimator's table.
    pub table: f64,
    /// Nearest-rank value over the draws.
    pub simulated: f64,
}

/// Monte Carlo cross-check of an estimator's table, in the estimate's unit.
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub sample_size: usize,
    pub unit: Unit,
    pub table_mean: f64,
    pub simulated_mean: f64,
    pub percentiles: Vec<SimulatedPercentile>,
}

pub fn simulate(
    estimator: &Estimator,
    estimate: &Estimate,
    sample_size: usize,
    seed: Option<u64>,
) -> Result<Simulation, EstimateError> {
    match seed {
        Some(seed) => simulate_with(estimator, estimate, sample_size, &mut StdRng::seed_from_u64(seed)),
        None => simulate_with(estimator, estimate, sample_size, &mut rand::thread_rng()),
    }
}

pub fn simulate_with<R: Rng + ?Sized>(
    estimator: &Estimator,
    estimate: &Estimate,
    sample_size: usize,
    rng: &mut R,
) -> Result<Simulation, EstimateError> {
    if sample_size == 0 {
        return Err(EstimateError::EmptySimulation);
    }
    let median_hours = estimate.hours();
    let unit = estimate.unit();
    let distribution = log_normal_from_median(median_hours, estimator.sigma())?;

    let mut draws = Vec::with_capacity(sample_size);
    for i in 0..sample_size {
        draws.push(distribution.sample(rng));
        if i % PROGRESS_EVERY == 0 {
            debug!("Sampled {} of {}.", i, sample_size);
        }
    }
    draws.sort_by(f64::total_cmp);

    let simulated_mean = draws.iter().sum::<f64>() / sample_size as f64;
    let percentiles = estimator
        .percentiles(median_hours)
        .into_iter()
        .map(|p| SimulatedPercentile {
            label: p.label,
            level: p.level,
            table: unit.from_canonical(p.value),
            simulated: unit.from_canonical(nearest_rank(&draws, p.level)),
        })
        .collect();

    info!(sample_size, simulated_mean, "simulation finished");
    Ok(Simulation {
        sample_size,
        unit,
        table_mean: unit.from_canonical(estimator.mean(median_hours)),
        simulated_mean: unit.from_canonical(simulated_mean),
        percentiles,
    })
}

/// Nearest-rank percentile of ascending, non-empty `sorted`.
fn nearest_rank(sorted: &[f64], level: f64) -> f64 {
    let rank = (level * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::Calibration;

    #[test]
    fn nearest_rank_picks_ceiling() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(nearest_rank(&sorted, 0.5), 5.0);
        assert_eq!(nearest_rank(&sorted, 0.99), 10.0);
        assert_eq!(nearest_rank(&sorted, 0.0), 1.0);
        assert_eq!(nearest_rank(&[42.0], 0.75), 42.0);
    }

    #[test]
    fn zero_samples_is_an_error() {
        let estimator = Estimator::from(Calibration::ShapeOne);
        let estimate = Estimate::new(10.0, Unit::Hours).unwrap();
        assert!(matches!(
            simulate(&estimator, &estimate, 0, Some(1)),
            Err(EstimateError::EmptySimulation)
        ));
    }

    #[test]
    fn seeded_runs_repeat() {
        let estimator = Estimator::from(Calibration::Spread16);
        let estimate = Estimate::new(2.0, Unit::Days).unwrap();
        let a = simulate(&estimator, &estimate, 5_000, Some(7)).unwrap();
        let b = simulate(&estimator, &estimate, 5_000, Some(7)).unwrap();
        assert_eq!(a.simulated_mean, b.simulated_mean);
        assert_eq!(a.percentiles[2].simulated, b.percentiles[2].simulated);
    }

    #[test]
    fn quantile_table_matches_draws() {
        let estimator = Estimator::from(Calibration::Spread16);
        let estimate = Estimate::new(10.0, Unit::Hours).unwrap();
        let sim = simulate(&estimator, &estimate, 200_000, Some(42)).unwrap();

        assert_eq!(sim.unit, Unit::Hours);
        assert!((sim.simulated_mean - 16.0).abs() < 0.5, "mean {}", sim.simulated_mean);
        for p in sim.percentiles.iter().filter(|p| p.level < 0.95) {
            let rel = (p.simulated - p.table).abs() / p.table;
            assert!(rel < 0.03, "{} off by {rel}", p.label);
        }
    }

    #[test]
    fn guideline_table_differs_from_true_quantiles() {
        // sigma = 1: true P80 is about 2.32 m and true P99 about 10.2 m
        let estimator = Estimator::from(Calibration::ShapeOne);
        let estimate = Estimate::new(10.0, Unit::Hours).unwrap();
        let sim = simulate(&estimator, &estimate, 100_000, Some(3)).unwrap();

        let by_label = |label: &str| sim.percentiles.iter().find(|p| p.label == label).unwrap();
        assert!((by_label("P50").simulated - 10.0).abs() < 0.3);
        assert!(by_label("P80").simulated < by_label("P80").table);
        assert!(by_label("P99").simulated > by_label("P99").table);
        assert!((sim.simulated_mean - sim.table_mean).abs() < 0.5);
    }
}
