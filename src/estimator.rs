use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::EstimateError,
    statistics::{log_normal_pdf, log_normal_quantile, z_score},
    unit::Unit,
};

/// Number of (x, density) pairs in a curve.
pub const SAMPLE_POINTS: usize = 200;
/// Quantile used as the right edge of the plotted range.
pub const UPPER_LEVEL: f64 = 0.99;

const RANGE_FLOOR_HOURS: f64 = 0.01;
const RANGE_FLOOR_FRACTION: f64 = 0.001;

/// Largest accepted median in hours. The plotted range reaches about 10.24 m
/// and minute conversion multiplies by 60, both of which must stay finite.
pub const MAX_MEDIAN_HOURS: f64 = f64::MAX / 1e3;
/// Smallest accepted median in hours. 0.001 m must stay a normal float so the
/// density at the first point does not overflow.
pub const MIN_MEDIAN_HOURS: f64 = f64::MIN_POSITIVE * 1e6;

/// Communication guideline for the shape-one calibration: (label, level, multiple of m).
const GUIDELINE_MULTIPLIERS: [(&str, f64, f64); 5] = [
    ("P50", 0.50, 1.0),
    ("P80", 0.80, 3.0),
    ("P90", 0.90, 4.0),
    ("P95", 0.95, 5.0),
    ("P99", 0.99, 7.0),
];

const QUANTILE_LEVELS: [(&str, f64); 4] = [
    ("P50", 0.50),
    ("P75", 0.75),
    ("P90", 0.90),
    ("P99", 0.99),
];

/// Mean-to-median ratio of the spread-1.6 calibration.
const SPREAD_MEAN_RATIO: f64 = 1.6;

/// The two calibrations of the model a user can pick from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Calibration {
    /// sigma = 1 with the "m * 3 / 4 / 5 / 7" guideline percentiles.
    #[default]
    #[serde(rename = "shape-one")]
    #[value(name = "shape-one")]
    ShapeOne,
    /// sigma = sqrt(2 ln 1.6), so that the mean is 1.6 m, with exact quantiles.
    #[serde(rename = "spread-1.6")]
    #[value(name = "spread-1.6")]
    Spread16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentileMode {
    /// Fixed multiples of the median.
    Empirical,
    /// median * exp(sigma * z_p).
    Quantile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeanRule {
    /// median * exp(sigma^2 / 2)
    Analytic,
    /// median * constant
    Multiplier(f64),
}

/// Shape of the distribution, fixed at estimator construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatorConfig {
    pub sigma: f64,
    pub percentile_mode: PercentileMode,
    pub mean_rule: MeanRule,
}

impl From<Calibration> for EstimatorConfig {
    fn from(calibration: Calibration) -> Self {
        match calibration {
            Calibration::ShapeOne => EstimatorConfig {
                sigma: 1.0,
                percentile_mode: PercentileMode::Empirical,
                mean_rule: MeanRule::Analytic,
            },
            Calibration::Spread16 => EstimatorConfig {
                sigma: (2.0 * SPREAD_MEAN_RATIO.ln()).sqrt(),
                percentile_mode: PercentileMode::Quantile,
                mean_rule: MeanRule::Multiplier(SPREAD_MEAN_RATIO),
            },
        }
    }
}

/// A validated median estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    value: f64,
    unit: Unit,
}

impl Estimate {
    pub fn new(value: f64, unit: Unit) -> Result<Self, EstimateError> {
        let hours = unit.to_canonical(value);
        if !value.is_finite()
            || value <= 0.0
            || !(MIN_MEDIAN_HOURS..=MAX_MEDIAN_HOURS).contains(&hours)
        {
            return Err(EstimateError::InvalidEstimate(value.to_string()));
        }
        Ok(Estimate { value, unit })
    }

    /// Parses the raw text of a median estimate.
    pub fn parse(raw: &str, unit: Unit) -> Result<Self, EstimateError> {
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| EstimateError::InvalidEstimate(raw.to_string()))?;
        Self::new(value, unit).map_err(|_| EstimateError::InvalidEstimate(raw.to_string()))
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn hours(&self) -> f64 {
        self.unit.to_canonical(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Where a percentile value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Multiplier(f64),
    ZScore(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentile {
    pub label: &'static str,
    pub level: f64,
    pub value: f64,
    pub basis: Basis,
}

impl Percentile {
    fn in_unit(self, unit: Unit) -> Self {
        Percentile {
            value: unit.from_canonical(self.value),
            ..self
        }
    }
}

/// The evenly spaced points of a density curve. Cloning restarts the sequence.
#[derive(Debug, Clone)]
pub struct Samples {
    start: f64,
    end: f64,
    mu: f64,
    sigma: f64,
    unit: Unit,
    index: usize,
}

impl Iterator for Samples {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.index >= SAMPLE_POINTS {
            return None;
        }
        let t = self.index as f64 / (SAMPLE_POINTS - 1) as f64;
        self.index += 1;

        let x_hours = self.start + (self.end - self.start) * t;
        Some(Point {
            x: self.unit.from_canonical(x_hours),
            y: log_normal_pdf(x_hours, self.mu, self.sigma),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = SAMPLE_POINTS - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples {}

/// Everything needed to display one estimate, already in the estimate's unit.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub median: f64,
    pub unit: Unit,
    pub config: EstimatorConfig,
    pub mu: f64,
    pub mean: f64,
    pub mean_ratio: f64,
    pub percentiles: Vec<Percentile>,
    pub range: (f64, f64),
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Estimator { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn sigma(&self) -> f64 {
        self.config.sigma
    }

    /// Density at `x_hours` of the distribution whose median is `median_hours`.
    pub fn density(&self, x_hours: f64, median_hours: f64) -> f64 {
        log_normal_pdf(x_hours, median_hours.ln(), self.config.sigma)
    }

    /// Plotted range in hours: from just above zero to the 99th percentile.
    pub fn sample_range(&self, median_hours: f64) -> (f64, f64) {
        let end = log_normal_quantile(median_hours, self.config.sigma, UPPER_LEVEL);
        let start = RANGE_FLOOR_HOURS.max(median_hours * RANGE_FLOOR_FRACTION);
        if start < end {
            (start, end)
        } else {
            // the fixed floor overshoots very small medians
            (median_hours * RANGE_FLOOR_FRACTION, end)
        }
    }

    pub fn samples(&self, median_hours: f64, unit: Unit) -> Samples {
        let (start, end) = self.sample_range(median_hours);
        Samples {
            start,
            end,
            mu: median_hours.ln(),
            sigma: self.config.sigma,
            unit,
            index: 0,
        }
    }

    pub fn sample(&self, median_hours: f64, unit: Unit) -> Vec<Point> {
        self.samples(median_hours, unit).collect()
    }

    /// Percentile table in hours, ordered by level.
    pub fn percentiles(&self, median_hours: f64) -> Vec<Percentile> {
        match self.config.percentile_mode {
            PercentileMode::Empirical => GUIDELINE_MULTIPLIERS
                .iter()
                .map(|&(label, level, multiplier)| Percentile {
                    label,
                    level,
                    value: median_hours * multiplier,
                    basis: Basis::Multiplier(multiplier),
                })
                .collect(),
            PercentileMode::Quantile => QUANTILE_LEVELS
                .iter()
                .map(|&(label, level)| Percentile {
                    label,
                    level,
                    value: log_normal_quantile(median_hours, self.config.sigma, level),
                    basis: Basis::ZScore(z_score(level)),
                })
                .collect(),
        }
    }

    pub fn mean(&self, median_hours: f64) -> f64 {
        match self.config.mean_rule {
            MeanRule::Analytic => median_hours * (self.config.sigma.powi(2) / 2.0).exp(),
            MeanRule::Multiplier(ratio) => median_hours * ratio,
        }
    }

    pub fn report(&self, estimate: &Estimate) -> Report {
        let median_hours = estimate.hours();
        let unit = estimate.unit();
        let mean_hours = self.mean(median_hours);
        let (start, end) = self.sample_range(median_hours);
        debug!(median_hours, sigma = self.config.sigma, start, end, "building report");

        Report {
            median: estimate.value(),
            unit,
            config: self.config,
            mu: median_hours.ln(),
            mean: unit.from_canonical(mean_hours),
            mean_ratio: mean_hours / median_hours,
            percentiles: self
                .percentiles(median_hours)
                .into_iter()
                .map(|p| p.in_unit(unit))
                .collect(),
            range: (unit.from_canonical(start), unit.from_canonical(end)),
            points: self.sample(median_hours, unit),
        }
    }
}

impl From<Calibration> for Estimator {
    fn from(calibration: Calibration) -> Self {
        Estimator::new(calibration.into())
    }
}
