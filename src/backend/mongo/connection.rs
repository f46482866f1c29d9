//! MongoDB backend built on the official async driver.

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::debug;

use super::types::document_to_row;
use crate::backend::{BackendKind, DocumentBackend, FieldInput};
use crate::error::{Result, StoreError};
use crate::row::Row;

/// Live connection to the document backend.
pub struct MongoConnection {
    client: Client,
    database: Database,
}

impl MongoConnection {
    /// Open a client and verify the deployment with a ping.
    pub async fn connect(config: &crate::config::DocumentConfig) -> Result<Self> {
        let uri = format!("mongodb://{}:{}", config.host, config.port);
        let mut options = ClientOptions::parse(&uri).await.map_err(|e| {
            StoreError::connection(format!(
                "MongoDB at {}:{}/{}: {}",
                config.host, config.port, config.database, e
            ))
        })?;
        options.app_name = Some("storectl".to_string());
        options.server_selection_timeout = Some(Duration::from_secs(5));
        options.connect_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(options)
            .map_err(|e| StoreError::connection(format!("MongoDB client setup failed: {e}")))?;
        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| {
                StoreError::connection(format!(
                    "MongoDB at {}:{}/{}: {}",
                    config.host, config.port, config.database, e
                ))
            })?;

        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentBackend for MongoConnection {
    async fn collection_names(&self) -> Result<Vec<String>> {
        self.database
            .list_collection_names()
            .await
            .map_err(|e| StoreError::catalog_fetch(BackendKind::Document, e))
    }

    async fn sample_fields(&self, collection: &str, limit: usize) -> Result<Vec<String>> {
        debug!(collection, limit, "sampling document fields");

        let mut cursor = self
            .collection(collection)
            .find(doc! {})
            .limit(limit as i64)
            .await
            .map_err(|e| StoreError::schema_fetch(collection, e))?;

        // First-seen order across the sample, identity excluded.
        let mut fields: Vec<String> = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| StoreError::schema_fetch(collection, e))?
        {
            for key in document.keys() {
                if key != "_id" && !fields.iter().any(|f| f == key) {
                    fields.push(key.clone());
                }
            }
        }

        Ok(fields)
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<Row>> {
        debug!(collection, "fetching documents");

        let cursor = self
            .collection(collection)
            .find(doc! {})
            .await
            .map_err(|e| StoreError::execution(BackendKind::Document, e))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::execution(BackendKind::Document, e))?;

        Ok(documents.into_iter().map(document_to_row).collect())
    }

    async fn insert(&self, collection: &str, fields: &[FieldInput]) -> Result<()> {
        let mut document = Document::new();
        for field in fields {
            if let Some(value) = &field.value {
                document.insert(field.name.clone(), value.clone());
            }
        }
        debug!(collection, "inserting document");

        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::execution(BackendKind::Document, e))?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &Bson, fields: &[FieldInput]) -> Result<u64> {
        let mut changes = Document::new();
        for field in fields {
            if let Some(value) = &field.value {
                changes.insert(field.name.clone(), value.clone());
            }
        }
        debug!(collection, "updating document");

        // The identity is the fetched `_id` verbatim, so the filter matches
        // whatever BSON type the collection keys on.
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id.clone() }, doc! { "$set": changes })
            .await
            .map_err(|e| StoreError::execution(BackendKind::Document, e))?;

        Ok(result.matched_count)
    }

    async fn delete(&self, collection: &str, id: &Bson) -> Result<u64> {
        debug!(collection, "deleting document");

        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id.clone() })
            .await
            .map_err(|e| StoreError::execution(BackendKind::Document, e))?;

        Ok(result.deleted_count)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
