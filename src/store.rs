//! Exam document storage
//!
//! [`ExamStore`] is the seam the importer writes through. [`MongoExamStore`]
//! talks to the real collection, [`MemoryExamStore`] backs dry runs and tests.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::{Client, Collection};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("MongoDB request failed: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn count(&self) -> Result<u64, StoreError>;

    /// `exam_id` is matched as stored, so a numeric id finds a numeric id.
    async fn find_by_exam_id(&self, exam_id: &Bson) -> Result<Option<Document>, StoreError>;

    /// Replaces the whole document stored under `exam_id`; no field merge.
    async fn replace_by_exam_id(&self, exam_id: &Bson, doc: Document) -> Result<(), StoreError>;

    async fn insert(&self, doc: Document) -> Result<(), StoreError>;
}

pub struct MongoExamStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoExamStore {
    /// Connects and pings the database. No index is created: a collection that
    /// already holds duplicate ids must still import and report the excess.
    pub async fn connect(uri: &str, db_name: &str, collection: &str) -> Result<Self, StoreError> {
        // fail fast on an unreachable server instead of the 30s driver default
        let uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=5000&connectTimeoutMS=5000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=5000&connectTimeoutMS=5000", uri)
        };

        let client = Client::with_uri_str(&uri).await?;
        let database = client.database(db_name);
        database.run_command(doc! { "ping": 1 }).await?;

        info!(database = db_name, collection, "connected to MongoDB");

        let collection = database.collection::<Document>(collection);
        Ok(Self { client, collection })
    }

    /// Closes every pooled connection.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("MongoDB connection closed");
    }
}

#[async_trait]
impl ExamStore for MongoExamStore {
    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn find_by_exam_id(&self, exam_id: &Bson) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection
            .find_one(doc! { "exam_id": exam_id.clone() })
            .await?)
    }

    async fn replace_by_exam_id(&self, exam_id: &Bson, doc: Document) -> Result<(), StoreError> {
        self.collection
            .replace_one(doc! { "exam_id": exam_id.clone() }, doc)
            .await?;
        Ok(())
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        self.collection.insert_one(doc).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryExamStore {
    docs: Mutex<Vec<Document>>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: Vec<Document>) -> Self {
        Self {
            docs: Mutex::new(docs),
        }
    }
}

fn matches_exam_id(doc: &Document, exam_id: &Bson) -> bool {
    doc.get("exam_id") == Some(exam_id)
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.docs.lock().await.len() as u64)
    }

    async fn find_by_exam_id(&self, exam_id: &Bson) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.lock().await;
        Ok(docs.iter().find(|d| matches_exam_id(d, exam_id)).cloned())
    }

    async fn replace_by_exam_id(&self, exam_id: &Bson, doc: Document) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().await;
        if let Some(slot) = docs.iter_mut().find(|d| matches_exam_id(d, exam_id)) {
            *slot = doc;
        }
        Ok(())
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        self.docs.lock().await.push(doc);
        Ok(())
    }
}
