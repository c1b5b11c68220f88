//! Flat-file survey exports (CSV or JSON).

use super::SourceError;
use crate::models::{Field, SurveyResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Export format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Header row with survey column names.
    Csv,
    /// One JSON object per line, or a single JSON array of objects.
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// A survey export on disk. The file is re-read on every query.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: FileFormat,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let format = FileFormat::from_path(path)
            .ok_or_else(|| SourceError::UnsupportedFormat(path.display().to_string()))?;

        if !path.is_file() {
            return Err(SourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    pub fn describe(&self) -> String {
        let kind = match self.format {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        };
        format!("{} file {}", kind, self.path.display())
    }

    /// Read and decode every record.
    pub async fn load(&self) -> Result<Vec<SurveyResponse>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let records = match self.format {
            FileFormat::Csv => parse_csv(&content)?,
            FileFormat::Json => parse_json(&content)?,
        };

        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse a CSV export. Malformed rows are skipped with a warning.
pub fn parse_csv(content: &str) -> Result<Vec<SurveyResponse>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let missing: Vec<&str> = Field::ALL
        .iter()
        .map(Field::column)
        .filter(|column| !columns.contains_key(*column))
        .collect();
    if !missing.is_empty() {
        debug!("Export has no column for: {}", missing.join(", "));
    }

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(row) => {
                let response = SurveyResponse::from_columns(|column| {
                    columns
                        .get(column)
                        .and_then(|&i| row.get(i))
                        .map(str::to_string)
                });
                records.push(response);
            }
            Err(e) => {
                // +2: 1-based lines plus the header row
                warn!("Skipping malformed CSV row {}: {}", line + 2, e);
            }
        }
    }

    Ok(records)
}

/// Parse a JSON export: either a top-level array or one object per line.
pub fn parse_json(content: &str) -> Result<Vec<SurveyResponse>, SourceError> {
    if content.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(content)?;
        return Ok(values.iter().filter_map(decode_object).collect());
    }

    let mut records = Vec::new();
    for (line, text) in content.lines().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => records.extend(decode_object(&value)),
            Err(e) => warn!("Skipping malformed JSON line {}: {}", line + 1, e),
        }
    }
    Ok(records)
}

fn decode_object(value: &Value) -> Option<SurveyResponse> {
    let object = value.as_object()?;
    Some(SurveyResponse::from_columns(|column| {
        object.get(column).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }))
}
