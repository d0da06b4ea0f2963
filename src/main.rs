mod cli;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CurveFormat, EstimateArgs, TableFormat};
use logest::{
    config::Config,
    estimator::{Calibration, Estimate, Estimator},
    logging,
    render::{self, Chart, ChartSurface},
    simulate,
    unit::Unit,
};
use tracing::debug;

impl Cli {
    fn run(self, config: Config) -> Result<()> {
        let calibration = resolve_calibration(self.calibration, &config);
        let estimator = Estimator::from(calibration);
        debug!(?calibration, sigma = estimator.sigma(), "estimator ready");

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.command {
            Commands::Curve {
                estimate,
                format,
                width,
                height,
                points,
            } => {
                let estimate = estimate.resolve(&config)?;
                let report = estimator.report(&estimate);
                match format {
                    CurveFormat::Json => render::write_json(&mut out, &report)?,
                    CurveFormat::Csv => render::write_csv(&mut out, &report.points)?,
                    CurveFormat::Text => {
                        let mut surface = ChartSurface::new(
                            width.unwrap_or(config.chart.width),
                            height.unwrap_or(config.chart.height),
                        );
                        surface.render(Chart::from_report(&report));
                        if let Some(text) = surface.draw() {
                            writeln!(out, "{}", text)?;
                        }
                        for line in render::table_lines(&report) {
                            writeln!(out, "{}", line)?;
                        }
                        if let (true, Some(chart)) = (points, surface.current()) {
                            writeln!(out)?;
                            for point in &chart.points {
                                writeln!(out, "{}", chart.tooltip(point))?;
                            }
                        }
                    }
                }
            }
            Commands::Percentiles { estimate, format } => {
                let estimate = estimate.resolve(&config)?;
                let report = estimator.report(&estimate);
                match format {
                    TableFormat::Json => render::write_json(&mut out, &report)?,
                    TableFormat::Text => {
                        for line in render::table_lines(&report) {
                            writeln!(out, "{}", line)?;
                        }
                    }
                }
            }
            Commands::Simulate {
                estimate,
                sample_size,
                seed,
            } => {
                let estimate = estimate.resolve(&config)?;
                let sim = simulate::simulate(&estimator, &estimate, sample_size, seed)?;
                writeln!(out, "{} samples, {}", sim.sample_size, sim.unit)?;
                writeln!(out, "{:<6} {:>12} {:>12}", "", "table", "simulated")?;
                writeln!(out, "{:<6} {:>12.2} {:>12.2}", "Mean", sim.table_mean, sim.simulated_mean)?;
                for p in &sim.percentiles {
                    writeln!(out, "{:<6} {:>12.2} {:>12.2}", p.label, p.table, p.simulated)?;
                }
            }
        }

        Ok(())
    }
}

/// Command-line flag, then config file, then the built-in default.
fn resolve_calibration(flag: Option<Calibration>, config: &Config) -> Calibration {
    flag.or(config.calibration).unwrap_or_default()
}

impl EstimateArgs {
    fn resolve_unit(&self, config: &Config) -> Unit {
        match &self.unit {
            Some(name) => Unit::from_name_or_default(name),
            None => config.unit.unwrap_or_default(),
        }
    }

    fn resolve(&self, config: &Config) -> Result<Estimate> {
        Ok(Estimate::parse(&self.median, self.resolve_unit(config))?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Config::default(),
    };
    cli.run(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(median: &str, unit: Option<&str>) -> EstimateArgs {
        EstimateArgs {
            median: median.to_string(),
            unit: unit.map(str::to_string),
        }
    }

    fn config(text: &str) -> Config {
        Config::parse(text).unwrap()
    }

    #[test]
    fn calibration_flag_beats_config_beats_default() {
        let file = config(r#"calibration = "spread-1.6""#);
        assert_eq!(resolve_calibration(Some(Calibration::ShapeOne), &file), Calibration::ShapeOne);
        assert_eq!(resolve_calibration(None, &file), Calibration::Spread16);
        assert_eq!(resolve_calibration(None, &Config::default()), Calibration::ShapeOne);
    }

    #[test]
    fn unit_flag_beats_config_beats_default() {
        let file = config(r#"unit = "days""#);
        assert_eq!(args("2", Some("minutes")).resolve_unit(&file), Unit::Minutes);
        assert_eq!(args("2", None).resolve_unit(&file), Unit::Days);
        assert_eq!(args("2", None).resolve_unit(&Config::default()), Unit::Hours);
    }

    #[test]
    fn unknown_unit_flag_is_read_as_hours() {
        let file = config(r#"unit = "days""#);
        let estimate = args("3", Some("weeks")).resolve(&file).unwrap();
        assert_eq!(estimate.unit(), Unit::Hours);
        assert_eq!(estimate.hours(), 3.0);
    }

    #[test]
    fn bad_median_is_reported() {
        let err = args("-5", None).resolve(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("valid positive number"), "{err}");
    }
}
