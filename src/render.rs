use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::{
    estimator::{Basis, Point, Report},
    unit::Unit,
};

const MIN_WIDTH: usize = 10;
const MIN_HEIGHT: usize = 4;
const AXIS_GUTTER: usize = 10;

/// Text lines of the percentile table, mean second.
pub fn table_lines(report: &Report) -> Vec<String> {
    let unit = report.unit;
    let mut lines = Vec::with_capacity(report.percentiles.len() + 1);

    for (i, p) in report.percentiles.iter().enumerate() {
        if p.label == "P50" {
            lines.push(format!("P50 (Median): {:.2} {}", p.value, unit));
        } else {
            let basis = match p.basis {
                Basis::Multiplier(m) => format!("m * {}", m),
                Basis::ZScore(z) => format!("z = {:.3}", z),
            };
            lines.push(format!("{}: {:.2} {} ({})", p.label, p.value, unit, basis));
        }
        if i == 0 {
            lines.push(format!(
                "Mean (Average): {:.2} {} (≈{:.2} * m)",
                report.mean, unit, report.mean_ratio
            ));
        }
    }
    lines
}

/// Hover text for a single point, prefixed by the dataset label when there is one.
pub fn point_line(label: &str, point: &Point, unit: Unit) -> String {
    let mut line = String::new();
    if !label.is_empty() {
        line.push_str(label);
        line.push_str(": ");
    }
    line.push_str(&format!("Time: {:.2} {}, Density: {:.2e}", point.x, unit, point.y));
    line
}

/// One decimal like the widget (`1.0`), two when one would misstate sigma.
fn sigma_text(sigma: f64) -> String {
    let one = format!("{:.1}", sigma);
    if one.parse::<f64>().is_ok_and(|v| (v - sigma).abs() < 1e-9) {
        one
    } else {
        format!("{:.2}", sigma)
    }
}

/// A density curve ready to be drawn.
#[derive(Debug, Clone)]
pub struct Chart {
    pub label: String,
    pub x_title: String,
    pub y_title: String,
    pub unit: Unit,
    pub points: Vec<Point>,
    pub median: f64,
    pub median_label: String,
}

impl Chart {
    pub fn from_report(report: &Report) -> Self {
        let median = report
            .percentiles
            .iter()
            .find(|p| p.label == "P50")
            .map_or(report.median, |p| p.value);

        Chart {
            label: format!(
                "Probability Density (Median = {} {}, σ_ln = {})",
                report.median,
                report.unit,
                sigma_text(report.config.sigma)
            ),
            x_title: format!("Completion Time ({})", report.unit.title()),
            y_title: "Probability Density".to_string(),
            unit: report.unit,
            points: report.points.clone(),
            median,
            median_label: format!("Median (P50: {:.2})", median),
        }
    }

    pub fn tooltip(&self, point: &Point) -> String {
        point_line(&self.label, point, self.unit)
    }

    fn x_max(&self) -> f64 {
        self.points.iter().map(|p| p.x).fold(self.median, f64::max)
    }

    fn y_max(&self) -> f64 {
        self.points.iter().map(|p| p.y).fold(0.0, f64::max)
    }

    /// Linear interpolation of the curve; zero outside the sampled range.
    fn density_at(&self, x: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.x < x);
        if idx == 0 || idx >= self.points.len() {
            return match self.points.get(idx) {
                Some(p) if p.x == x => p.y,
                _ => 0.0,
            };
        }
        let (a, b) = (self.points[idx - 1], self.points[idx]);
        let t = (x - a.x) / (b.x - a.x);
        a.y + (b.y - a.y) * t
    }
}

/// Owns the chart currently on display.
///
/// Rendering a new chart disposes whatever was shown before, so at most one
/// chart is alive per surface.
#[derive(Debug)]
pub struct ChartSurface {
    width: usize,
    height: usize,
    current: Option<Chart>,
}

impl ChartSurface {
    pub fn new(width: usize, height: usize) -> Self {
        ChartSurface {
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
            current: None,
        }
    }

    pub fn render(&mut self, chart: Chart) -> &Chart {
        self.dispose();
        debug!(label = %chart.label, points = chart.points.len(), "rendering chart");
        self.current.insert(chart)
    }

    pub fn dispose(&mut self) {
        if let Some(old) = self.current.take() {
            debug!(label = %old.label, "disposing chart");
        }
    }

    pub fn current(&self) -> Option<&Chart> {
        self.current.as_ref()
    }

    /// The current chart as text, or `None` if nothing has been rendered.
    pub fn draw(&self) -> Option<String> {
        let chart = self.current.as_ref()?;
        let (width, height) = (self.width, self.height);
        let x_max = chart.x_max();
        let y_max = chart.y_max();

        let heights: Vec<f64> = (0..width)
            .map(|c| chart.density_at(x_max * (c as f64 + 0.5) / width as f64))
            .collect();
        let median_col = ((chart.median / x_max) * width as f64).floor() as usize;
        let median_col = median_col.min(width - 1);

        let mut out = String::new();
        out.push_str(&chart.label);
        out.push('\n');
        out.push_str(&chart.y_title);
        out.push('\n');

        for row in (0..height).rev() {
            let lower = y_max * row as f64 / height as f64;
            let upper = y_max * (row + 1) as f64 / height as f64;
            let axis = match row {
                r if r == height - 1 => format!("{:.2e}", y_max),
                0 => "0".to_string(),
                _ => String::new(),
            };
            out.push_str(&format!("{:>gutter$} |", axis, gutter = AXIS_GUTTER));
            for (col, &y) in heights.iter().enumerate() {
                let cell = if y > lower && y <= upper {
                    '*'
                } else if y > upper {
                    '.'
                } else if col == median_col {
                    '|'
                } else {
                    ' '
                };
                out.push(cell);
            }
            out.push('\n');
        }

        out.push_str(&format!("{:>gutter$} +{}\n", "", "-".repeat(width), gutter = AXIS_GUTTER));
        let x_label = format!("{:.2}", x_max);
        out.push_str(&format!(
            "{:>gutter$}  0{:>rest$}\n",
            "",
            x_label,
            gutter = AXIS_GUTTER,
            rest = width.saturating_sub(1),
        ));
        out.push_str(&format!("{:>gutter$}  {}\n", "", chart.x_title, gutter = AXIS_GUTTER));
        out.push_str(&format!(
            "{:>gutter$}  {}^ {}\n",
            "",
            " ".repeat(median_col),
            chart.median_label,
            gutter = AXIS_GUTTER
        ));
        Some(out)
    }
}

pub fn write_json<W: Write>(mut out: W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_csv<W: Write>(out: W, points: &[Point]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["x", "density"])?;
    for point in points {
        wtr.write_record([point.x.to_string(), point.y.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
