//! SVG bar charts, one per result set.

use super::ReportError;
use crate::analysis::AnalysisResult;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest x-axis label before it is shortened.
const MAX_LABEL_CHARS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Labelled values for one bar chart.
#[derive(Debug, Clone, PartialEq)]
struct BarSeries {
    title: String,
    x_desc: &'static str,
    y_desc: &'static str,
    bars: Vec<(String, f64)>,
}

fn bar_series(result: &AnalysisResult) -> BarSeries {
    let title = result.task().title().to_string();

    match result {
        AnalysisResult::TechStack(summary) => BarSeries {
            title,
            x_desc: "Age group",
            y_desc: "Mean compensation (top stack)",
            bars: summary
                .rows
                .iter()
                .map(|row| (row.age_group.to_string(), row.top.mean_compensation))
                .collect(),
        },
        AnalysisResult::CountryStack(summary) => BarSeries {
            title,
            x_desc: "Country",
            y_desc: "Respondents",
            bars: summary
                .rows
                .iter()
                .map(|row| (row.country.clone(), row.respondents as f64))
                .collect(),
        },
        AnalysisResult::MentalHealth(summary) => BarSeries {
            title,
            x_desc: "Age group / gender / ethnicity",
            y_desc: "Reporting an issue (%)",
            bars: summary
                .rows
                .iter()
                .map(|row| {
                    let label = format!("{} {} {}", row.age_group, row.gender, row.ethnicity);
                    (label, row.issue_percentage)
                })
                .collect(),
        },
        AnalysisResult::MentalHealthBehavior(summary) => BarSeries {
            title,
            x_desc: "Gender / ethnicity",
            y_desc: "Likely issues (%)",
            bars: summary
                .rows
                .iter()
                .map(|row| {
                    let label = format!("{} {}", row.gender, row.ethnicity);
                    (label, row.likely_issue_percentage)
                })
                .collect(),
        },
        AnalysisResult::RemoteWork(summary) => BarSeries {
            title,
            x_desc: "Age group / arrangement",
            y_desc: "Mean compensation",
            bars: summary
                .rows
                .iter()
                .map(|row| {
                    let label = format!("{} {}", row.age_group, row.remote_work);
                    (label, row.mean_compensation)
                })
                .collect(),
        },
        AnalysisResult::SelfTaught(outcome) => {
            let trained = outcome.population.saturating_sub(outcome.self_taught as u64);
            BarSeries {
                title,
                x_desc: "Learning path",
                y_desc: "Developers",
                bars: vec![
                    ("Self-taught".to_string(), outcome.self_taught as f64),
                    ("Formally trained".to_string(), trained as f64),
                ],
            }
        }
    }
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let head: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
    format!("{}...", head.trim_end())
}

fn chart_error<E: std::fmt::Display>(err: E) -> ReportError {
    ReportError::Chart(err.to_string())
}

fn draw_bar_chart(path: &Path, series: &BarSeries, options: ChartOptions) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let count = series.bars.len() as i32;
    let y_max = series
        .bars
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0_f64, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(&series.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(0..count, 0f64..y_top)
        .map_err(chart_error)?;

    let labels: Vec<String> = series.bars.iter().map(|(label, _)| shorten(label)).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(series.bars.len() + 1)
        .x_label_formatter(&|x: &i32| {
            usize::try_from(*x)
                .ok()
                .and_then(|i| labels.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .x_desc(series.x_desc)
        .y_desc(series.y_desc)
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(series.bars.iter().enumerate().map(|(idx, (_, value))| {
            let idx = idx as i32;
            let mut bar = Rectangle::new([(idx, 0.0), (idx + 1, *value)], BLUE.mix(0.7).filled());
            bar.set_margin(0, 0, 6, 6);
            bar
        }))
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

/// Write one SVG per non-empty result into `dir`, named after the task.
///
/// Returns the paths written.
pub fn write_charts(
    results: &[AnalysisResult],
    dir: &Path,
    options: ChartOptions,
) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for result in results {
        let series = bar_series(result);
        if series.bars.is_empty() {
            debug!("Skipping chart for {}: no rows", result.task().slug());
            continue;
        }

        let path = dir.join(format!("{}.svg", result.task().slug()));
        draw_bar_chart(&path, &series, options)?;
        info!("Chart saved to {}", path.display());
        written.push(path);
    }

    Ok(written)
}
