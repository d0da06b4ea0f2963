use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use logest::estimator::Calibration;

#[derive(Parser)]
#[command(author, version)]
/// Turn a single median guess into a log-normal completion-time distribution.
pub struct Cli {
    /// TOML file with default calibration, unit and chart size.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Which calibration of the model to use.
    #[arg(long, value_enum, global = true)]
    pub calibration: Option<Calibration>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Plot the density curve and print the percentile table.
    Curve {
        #[command(flatten)]
        estimate: EstimateArgs,

        #[arg(long, value_enum, default_value_t = CurveFormat::Text)]
        format: CurveFormat,

        /// Chart width in characters.
        #[arg(long)]
        width: Option<usize>,

        /// Chart height in rows.
        #[arg(long)]
        height: Option<usize>,

        /// Also list every plotted point.
        #[arg(long)]
        points: bool,
    },

    /// Print only the percentile table and mean.
    Percentiles {
        #[command(flatten)]
        estimate: EstimateArgs,

        #[arg(long, value_enum, default_value_t = TableFormat::Text)]
        format: TableFormat,
    },

    /// Sample the distribution and compare the draws against the table.
    Simulate {
        #[command(flatten)]
        estimate: EstimateArgs,

        /// The number of samples to draw.
        #[arg(short = 'n', long, default_value = "100000")]
        sample_size: usize,

        /// Seed for reproducible draws.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args, Clone)]
pub struct EstimateArgs {
    /// The median (P50) estimate.
    #[arg(allow_hyphen_values = true)]
    pub median: String,

    /// minutes, hours or days. Anything else is read as hours.
    #[arg(short, long)]
    pub unit: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum CurveFormat {
    Text,
    Json,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TableFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_curve_with_globals() {
        let cli = Cli::try_parse_from([
            "logest", "curve", "3", "-u", "days", "--calibration", "spread-1.6", "--format", "csv",
        ])
        .unwrap();
        assert_eq!(cli.calibration, Some(Calibration::Spread16));
        match cli.command {
            Commands::Curve { estimate, format, .. } => {
                assert_eq!(estimate.median, "3");
                assert_eq!(estimate.unit.as_deref(), Some("days"));
                assert_eq!(format, CurveFormat::Csv);
            }
            _ => panic!("expected curve"),
        }
    }

    #[test]
    fn negative_median_reaches_validation() {
        let cli = Cli::try_parse_from(["logest", "percentiles", "-5"]).unwrap();
        match cli.command {
            Commands::Percentiles { estimate, .. } => assert_eq!(estimate.median, "-5"),
            _ => panic!("expected percentiles"),
        }
    }

    #[test]
    fn simulate_defaults() {
        let cli = Cli::try_parse_from(["logest", "simulate", "8"]).unwrap();
        match cli.command {
            Commands::Simulate { sample_size, seed, .. } => {
                assert_eq!(sample_size, 100_000);
                assert_eq!(seed, None);
            }
            _ => panic!("expected simulate"),
        }
    }
}
