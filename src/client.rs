//! Session-wide ownership of the two backend connections.

use tracing::warn;

use crate::backend::{DocumentBackend, MongoConnection, PostgresConnection, RelationalBackend};
use crate::catalog::{resolve_catalog, LogicalEntity};
use crate::config::{EntityRegistry, StoreConfig};
use crate::error::{Result, StoreError};
use crate::executor::Executor;

/// Holds at most one live handle per backend for the whole session.
pub struct StoreClient {
    relational: Option<Box<dyn RelationalBackend>>,
    document: Option<Box<dyn DocumentBackend>>,
    registry: EntityRegistry,
}

impl StoreClient {
    pub fn new(registry: EntityRegistry) -> Self {
        Self {
            relational: None,
            document: None,
            registry,
        }
    }

    /// Connect to both backends, closing any previously held handles
    /// first.
    ///
    /// Both connections are always attempted. Returns the per-backend
    /// failures of a partially connected session; errs only when neither
    /// backend is reachable.
    pub async fn connect(&mut self, config: &StoreConfig) -> Result<Vec<StoreError>> {
        self.shutdown().await;

        let mut failures = Vec::new();

        match PostgresConnection::connect(&config.relational).await {
            Ok(connection) => self.relational = Some(Box::new(connection)),
            Err(e) => failures.push(e),
        }

        match MongoConnection::connect(&config.document).await {
            Ok(connection) => self.document = Some(Box::new(connection)),
            Err(e) => failures.push(e),
        }

        if self.relational.is_none() && self.document.is_none() {
            let combined = failures
                .iter()
                .map(|e| match e {
                    StoreError::Connection { message } => message.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(StoreError::connection(combined));
        }

        Ok(failures)
    }

    /// Close whichever handles are open.
    pub async fn shutdown(&mut self) {
        if let Some(backend) = self.relational.take() {
            if let Err(e) = backend.close().await {
                warn!("closing relational backend: {e}");
            }
        }
        if let Some(backend) = self.document.take() {
            if let Err(e) = backend.close().await {
                warn!("closing document backend: {e}");
            }
        }
    }

    pub fn relational(&self) -> Option<&dyn RelationalBackend> {
        self.relational.as_deref()
    }

    pub fn document(&self) -> Option<&dyn DocumentBackend> {
        self.document.as_deref()
    }

    pub fn has_any_backend(&self) -> bool {
        self.relational.is_some() || self.document.is_some()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The merged catalog over whichever backends are connected.
    pub async fn catalog(&self) -> Vec<LogicalEntity> {
        resolve_catalog(self.relational(), self.document(), &self.registry).await
    }

    /// Executor over the currently connected backends.
    pub fn executor(&self) -> Executor<'_> {
        Executor::new(self.relational(), self.document(), &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_client_has_no_backends() {
        let client = StoreClient::new(EntityRegistry::empty());
        assert!(!client.has_any_backend());
        assert!(client.relational().is_none());
        assert!(client.document().is_none());
        assert!(client.catalog().await.is_empty());
    }
}
