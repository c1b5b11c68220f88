//! Survey data sources.
//!
//! The production data lives in a MongoDB collection; a CSV or JSON export
//! of the same survey can stand in for it. Both backends expose the same two
//! operations: run the `$match`/`$project` part of a query and count
//! documents matching a filter. Every call re-reads the full collection.

pub mod file;
pub mod filter;
pub mod mongo;

pub use file::FileSource;
pub use filter::{Pattern, RecordFilter};
pub use mongo::MongoSource;

use crate::models::{Field, SurveyResponse};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors raised while talking to a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No connection string configured (set CONNECTION_STRING, or pass --uri or --file)")]
    MissingConnectionString,

    #[error("Unsupported survey file format: {0}")]
    UnsupportedFormat(String),
}

/// Where to read survey responses from.
#[derive(Debug, Clone, Default)]
pub struct SourceSettings {
    /// MongoDB connection string.
    pub uri: Option<String>,
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
    /// Local export; takes precedence over `uri` when set.
    pub file: Option<PathBuf>,
}

/// An open data source.
pub enum DataSource {
    Mongo(MongoSource),
    File(FileSource),
}

impl DataSource {
    /// Open the configured source. Connection failures are fatal.
    pub async fn connect(settings: &SourceSettings) -> Result<Self, SourceError> {
        if let Some(ref path) = settings.file {
            return Ok(DataSource::File(FileSource::open(path)?));
        }

        let uri = settings
            .uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(SourceError::MissingConnectionString)?;

        let source = MongoSource::connect(uri, &settings.database, &settings.collection).await?;
        Ok(DataSource::Mongo(source))
    }

    /// Human-readable description for reports.
    pub fn describe(&self) -> String {
        match self {
            DataSource::Mongo(source) => source.describe(),
            DataSource::File(source) => source.describe(),
        }
    }

    /// Run the filter and projection stages of a query and return the
    /// matching records, fully materialized.
    ///
    /// The filter is re-applied in memory after decoding so both backends
    /// agree on missing-value handling.
    pub async fn run_aggregation(
        &self,
        filter: &RecordFilter,
        projection: &[Field],
    ) -> Result<Vec<SurveyResponse>, SourceError> {
        let records = match self {
            DataSource::Mongo(source) => {
                let pipeline = MongoSource::pipeline(filter, projection);
                let documents = source.aggregate(pipeline).await?;
                documents.iter().map(mongo::decode_document).collect()
            }
            DataSource::File(source) => source.load().await?,
        };

        let fetched = records.len();
        let matched: Vec<SurveyResponse> = records
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();

        debug!("Fetched {} records, {} matched the filter", fetched, matched.len());
        Ok(matched)
    }

    /// Count records matching a filter.
    pub async fn count(&self, filter: &RecordFilter) -> Result<u64, SourceError> {
        match self {
            DataSource::Mongo(source) => source.count(filter.to_document()).await,
            DataSource::File(source) => {
                let records = source.load().await?;
                Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
            }
        }
    }
}
