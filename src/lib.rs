//! Log-normal completion-time estimates from a single median guess.
//!
//! ```
//! use logest::estimator::{Calibration, Estimate, Estimator};
//! use logest::unit::Unit;
//!
//! let estimator = Estimator::from(Calibration::ShapeOne);
//! let report = estimator.report(&Estimate::new(10.0, Unit::Hours).unwrap());
//! assert_eq!(report.percentiles[1].value, 30.0);
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod logging;
pub mod render;
pub mod simulate;
pub mod statistics;
pub mod unit;
