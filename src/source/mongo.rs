//! MongoDB-backed survey collection.

use super::{RecordFilter, SourceError};
use crate::models::{Field, SurveyResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};
use tracing::{debug, info};

/// Handle to the survey collection.
pub struct MongoSource {
    collection: Collection<Document>,
    database: String,
    name: String,
}

impl MongoSource {
    /// Connect and ping the server so bad credentials fail here rather than
    /// on the first query.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, SourceError> {
        info!("Connecting to MongoDB ({}.{})", database, collection);

        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;

        debug!("MongoDB ping succeeded");

        Ok(Self {
            collection: db.collection::<Document>(collection),
            database: database.to_string(),
            name: collection.to_string(),
        })
    }

    pub fn describe(&self) -> String {
        format!("mongodb://{}/{}", self.database, self.name)
    }

    /// Build the `$match`/`$project` pipeline for a query.
    pub fn pipeline(filter: &RecordFilter, projection: &[Field]) -> Vec<Document> {
        let mut pipeline = Vec::new();

        let matcher = filter.to_document();
        if !matcher.is_empty() {
            pipeline.push(doc! { "$match": matcher });
        }

        let mut fields = projection.to_vec();
        for field in filter.fields() {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        if !fields.is_empty() {
            let mut project = doc! { "_id": 0 };
            for field in fields {
                project.insert(field.column(), 1);
            }
            pipeline.push(doc! { "$project": project });
        }

        pipeline
    }

    /// Run an aggregation pipeline and materialize the cursor.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, SourceError> {
        debug!("Running aggregation with {} stages", pipeline.len());
        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    pub async fn count(&self, filter: Document) -> Result<u64, SourceError> {
        Ok(self.collection.count_documents(filter).await?)
    }
}

/// Decode a collection document into a response.
pub fn decode_document(document: &Document) -> SurveyResponse {
    SurveyResponse::from_columns(|column| document.get(column).and_then(bson_text))
}

/// Raw text of a BSON scalar; containers and nulls have none.
fn bson_text(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(i) => Some(i.to_string()),
        Bson::Int64(i) => Some(i.to_string()),
        Bson::Double(f) => Some(f.to_string()),
        Bson::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
