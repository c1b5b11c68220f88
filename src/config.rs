//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.surveystat.toml` files.

use crate::analysis::{
    default_countries, AnalysisSettings, DEFAULT_FORMAL_TRAINING_PATTERN, DEFAULT_REFUSAL_PATTERN,
};
use crate::report::ChartOptions;
use crate::source::SourceSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".surveystat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the survey responses live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Environment variable holding the MongoDB connection string.
    #[serde(default = "default_connection_env")]
    pub connection_env: String,

    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Local CSV or JSON-lines export used instead of MongoDB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Connection string given on the command line. Never written to disk.
    #[serde(skip)]
    pub uri: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            connection_env: default_connection_env(),
            database: default_database(),
            collection: default_collection(),
            file: None,
            uri: None,
        }
    }
}

fn default_connection_env() -> String {
    "CONNECTION_STRING".to_string()
}

fn default_database() -> String {
    "StackOverflow2022".to_string()
}

fn default_collection() -> String {
    "surveyresult".to_string()
}

/// Tunables of the analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Countries compared by the per-country stack query.
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,

    /// Maximum countries reported.
    #[serde(default = "default_country_limit")]
    pub country_limit: usize,

    /// Maximum rows of the demographic mental-health query.
    #[serde(default = "default_demographic_limit")]
    pub demographic_limit: usize,

    /// Maximum rows of the behavior mental-health query.
    #[serde(default = "default_behavior_limit")]
    pub behavior_limit: usize,

    /// Gender/ethnicity answers excluded from the behavior query.
    #[serde(default = "default_refusal_pattern")]
    pub refusal_pattern: String,

    /// Learning methods that count as formal training (case-insensitive).
    #[serde(default = "default_formal_training_pattern")]
    pub formal_training_pattern: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            country_limit: default_country_limit(),
            demographic_limit: default_demographic_limit(),
            behavior_limit: default_behavior_limit(),
            refusal_pattern: default_refusal_pattern(),
            formal_training_pattern: default_formal_training_pattern(),
        }
    }
}

fn default_country_limit() -> usize {
    5
}

fn default_demographic_limit() -> usize {
    10
}

fn default_behavior_limit() -> usize {
    5
}

fn default_refusal_pattern() -> String {
    DEFAULT_REFUSAL_PATTERN.to_string()
}

fn default_formal_training_pattern() -> String {
    DEFAULT_FORMAL_TRAINING_PATTERN.to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Chart width in pixels.
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,

    /// Write charts here on every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
            chart_dir: None,
        }
    }
}

fn default_chart_width() -> u32 {
    1280
}

fn default_chart_height() -> u32 {
    720
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref uri) = args.uri {
            self.source.uri = Some(uri.clone());
        }
        if let Some(ref database) = args.database {
            self.source.database = database.clone();
        }
        if let Some(ref collection) = args.collection {
            self.source.collection = collection.clone();
        }
        if let Some(ref file) = args.file {
            self.source.file = Some(file.clone());
        }
        if let Some(ref charts) = args.charts {
            self.report.chart_dir = Some(charts.clone());
        }
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("country_limit", self.analysis.country_limit),
            ("demographic_limit", self.analysis.demographic_limit),
            ("behavior_limit", self.analysis.behavior_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                bail!("analysis.{} must be at least 1", name);
            }
        }

        if self.analysis.countries.is_empty() {
            bail!("analysis.countries must name at least one country");
        }

        if self.report.chart_width < 100 || self.report.chart_height < 100 {
            bail!("Chart dimensions must be at least 100x100 pixels");
        }

        Ok(())
    }

    /// Data source settings, with the connection string resolved from the
    /// command line or the configured environment variable.
    pub fn source_settings(&self) -> SourceSettings {
        let uri = self
            .source
            .uri
            .clone()
            .or_else(|| std::env::var(&self.source.connection_env).ok());

        SourceSettings {
            uri,
            database: self.source.database.clone(),
            collection: self.source.collection.clone(),
            file: self.source.file.clone(),
        }
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            countries: self.analysis.countries.clone(),
            country_limit: self.analysis.country_limit,
            demographic_limit: self.analysis.demographic_limit,
            behavior_limit: self.analysis.behavior_limit,
            refusal_pattern: self.analysis.refusal_pattern.clone(),
            formal_training_pattern: self.analysis.formal_training_pattern.clone(),
        }
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            width: self.report.chart_width,
            height: self.report.chart_height,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
