//! Presentation of analysis results.
//!
//! Results are rendered as console text, Markdown tables, JSON, or SVG bar
//! charts. Every renderer takes the materialized results it draws.

pub mod chart;
pub mod generator;

pub use chart::{write_charts, ChartOptions};
pub use generator::{render_console, render_json, render_markdown};

use crate::analysis::AnalysisResult;
use crate::models::ReportMetadata;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while rendering or writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to draw chart: {0}")]
    Chart(String),
}

/// A complete run: metadata plus every result set, in run order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub results: Vec<AnalysisResult>,
}
