//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::Task;
use clap::Parser;
use std::path::PathBuf;

/// surveystat - descriptive statistics over the Stack Overflow developer survey
///
/// Runs a fixed set of aggregation queries against the survey collection
/// and prints the results as tables, Markdown, JSON or SVG charts.
///
/// Examples:
///   surveystat
///   surveystat --task remote-work --format markdown -o remote.md
///   surveystat --file survey_results_public.csv --charts charts/
///   surveystat --count-only
///   surveystat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis to run
    #[arg(short, long, default_value = "all", value_name = "TASK")]
    pub task: TaskSelection,

    /// Output format (console, markdown, json)
    #[arg(long, default_value = "console", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for SVG charts (one per result)
    #[arg(long, value_name = "DIR")]
    pub charts: Option<PathBuf>,

    /// Read a CSV or JSON-lines export instead of MongoDB
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// MongoDB connection string
    ///
    /// Can also be set via the CONNECTION_STRING env var.
    #[arg(long, value_name = "URI", env = "CONNECTION_STRING", hide_env_values = true)]
    pub uri: Option<String>,

    /// Database name (default: StackOverflow2022)
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// Collection name (default: surveyresult)
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .surveystat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the number of survey responses and exit
    #[arg(long)]
    pub count_only: bool,

    /// Generate a default .surveystat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Which analyses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TaskSelection {
    /// Every analysis, in order
    #[default]
    All,
    TechStack,
    CountryStack,
    MentalHealth,
    MentalHealthBehavior,
    RemoteWork,
    SelfTaught,
}

impl TaskSelection {
    pub fn tasks(&self) -> Vec<Task> {
        match self {
            TaskSelection::All => Task::ALL.to_vec(),
            TaskSelection::TechStack => vec![Task::TechStack],
            TaskSelection::CountryStack => vec![Task::CountryStack],
            TaskSelection::MentalHealth => vec![Task::MentalHealth],
            TaskSelection::MentalHealthBehavior => vec![Task::MentalHealthBehavior],
            TaskSelection::RemoteWork => vec![Task::RemoteWork],
            TaskSelection::SelfTaught => vec![Task::SelfTaught],
        }
    }
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain-text tables (default)
    #[default]
    Console,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref file) = self.file {
            if !file.is_file() {
                return Err(format!("Survey file does not exist: {}", file.display()));
            }
        } else if let Some(ref uri) = self.uri {
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(
                    "Connection string must start with 'mongodb://' or 'mongodb+srv://'"
                        .to_string(),
                );
            }
        }

        for (flag, value) in [("--database", &self.database), ("--collection", &self.collection)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(format!("{} must not be empty", flag));
            }
        }

        if let Some(ref charts) = self.charts {
            if charts.is_file() {
                return Err(format!(
                    "Chart path is a file, not a directory: {}",
                    charts.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
