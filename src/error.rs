use std::path::PathBuf;

/// Errors surfaced to the user. The estimator itself never fails once it has
/// a validated [`Estimate`](crate::estimator::Estimate).
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("invalid estimate '{0}': please enter a valid positive number for the median estimate")]
    InvalidEstimate(String),

    #[error("simulation needs at least one sample")]
    EmptySimulation,

    #[error("cannot build log-normal distribution: {0}")]
    Distribution(String),

    #[error("cannot read config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
