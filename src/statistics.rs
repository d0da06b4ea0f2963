use std::f64::consts::{PI, SQRT_2};

use puruspe::inverf;
use rand_distr::LogNormal;

use crate::error::EstimateError;

/// Standard normal quantile: the z with P(Z <= z) = p.
pub fn z_score(p: f64) -> f64 {
    SQRT_2 * inverf(2.0 * p - 1.0)
}

/// Log-normal probability density at `x` for ln X ~ N(mu, sigma^2).
/// Zero for `x <= 0`.
pub fn log_normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let scale = 1.0 / (x * sigma * (2.0 * PI).sqrt());
    let spread = (x.ln() - mu).powi(2) / (2.0 * sigma * sigma);
    scale * (-spread).exp()
}

/// Value at quantile `p` of the log-normal anchored at `median`.
pub fn log_normal_quantile(median: f64, sigma: f64, p: f64) -> f64 {
    median * (sigma * z_score(p)).exp()
}

/// rand_distr only rejects a non-finite sigma, so a non-positive one is refused here.
pub fn log_normal_from_median(median: f64, sigma: f64) -> Result<LogNormal<f64>, EstimateError> {
    if !(sigma > 0.0) {
        return Err(EstimateError::Distribution(format!("sigma must be positive, got {sigma}")));
    }
    LogNormal::new(median.ln(), sigma).map_err(|e| EstimateError::Distribution(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn z_scores_match_normal_table() {
        assert!(z_score(0.5).abs() < 1e-9);
        assert!((z_score(0.75) - 0.67449).abs() < 1e-4);
        assert!((z_score(0.90) - 1.28155).abs() < 1e-4);
        assert!((z_score(0.99) - 2.32635).abs() < 1e-4);
    }

    #[test]
    fn pdf_peaks_below_median() {
        // mode of a log-normal is exp(mu - sigma^2)
        let mu = 10f64.ln();
        let mode = (mu - 1.0).exp();
        let at_mode = log_normal_pdf(mode, mu, 1.0);
        assert!(at_mode > log_normal_pdf(mode * 0.9, mu, 1.0));
        assert!(at_mode > log_normal_pdf(mode * 1.1, mu, 1.0));
    }

    #[test]
    fn pdf_is_zero_at_and_below_origin() {
        assert_eq!(log_normal_pdf(0.0, 0.0, 1.0), 0.0);
        assert_eq!(log_normal_pdf(-3.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn quantile_at_half_is_median() {
        assert!((log_normal_quantile(10.0, 1.0, 0.5) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn distribution_rejects_bad_sigma() {
        assert!(log_normal_from_median(10.0, f64::NAN).is_err());
        assert!(log_normal_from_median(10.0, f64::INFINITY).is_err());
        assert!(log_normal_from_median(10.0, -1.0).is_err());
        assert!(log_normal_from_median(10.0, 0.0).is_err());
        assert!(log_normal_from_median(10.0, 1.0).is_ok());
    }

    proptest! {
        #[test]
        fn pdf_never_negative(x in -1e3f64..1e6, median in 1e-3f64..1e4) {
            let density = log_normal_pdf(x, median.ln(), 1.0);
            prop_assert!(density >= 0.0);
            prop_assert!(density.is_finite());
        }
    }
}
