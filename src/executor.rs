//! CRUD execution against the resolved backends.
//!
//! The executor is the single place that dispatches an operation to the
//! right backend(s) for a logical entity. Reads concatenate both sides,
//! writes go to exactly one side, and all addressing goes through the
//! declared primary key or the document identity.

use tracing::warn;

use crate::backend::{BackendKind, DocumentBackend, FieldInput, RelationalBackend};
use crate::catalog::LogicalEntity;
use crate::config::EntityRegistry;
use crate::error::{Result, StoreError};
use crate::row::{Row, RowKey};

/// How many documents to sample when an entity has no declared field list.
pub const SAMPLE_LIMIT: usize = 5;

/// Dispatches CRUD operations for logical entities.
pub struct Executor<'a> {
    relational: Option<&'a dyn RelationalBackend>,
    document: Option<&'a dyn DocumentBackend>,
    registry: &'a EntityRegistry,
}

impl<'a> Executor<'a> {
    pub fn new(
        relational: Option<&'a dyn RelationalBackend>,
        document: Option<&'a dyn DocumentBackend>,
        registry: &'a EntityRegistry,
    ) -> Self {
        Self {
            relational,
            document,
            registry,
        }
    }

    fn relational_required(&self) -> Result<&'a dyn RelationalBackend> {
        self.relational.ok_or_else(|| {
            StoreError::execution(BackendKind::Relational, "backend is not connected")
        })
    }

    fn document_required(&self) -> Result<&'a dyn DocumentBackend> {
        self.document
            .ok_or_else(|| StoreError::execution(BackendKind::Document, "backend is not connected"))
    }

    /// Fetch every row of the entity, relational rows first, each side in
    /// its native order.
    pub async fn read_all(&self, entity: &LogicalEntity) -> Result<Vec<Row>> {
        if !entity.in_relational && !entity.in_document {
            return Err(StoreError::entity_not_found(&entity.name));
        }

        let mut rows = Vec::new();
        if entity.in_relational {
            if let Some(backend) = self.relational {
                rows.extend(backend.fetch_all(&entity.name).await?);
            }
        }
        if entity.in_document {
            if let Some(backend) = self.document {
                rows.extend(backend.fetch_all(&entity.name).await?);
            }
        }
        Ok(rows)
    }

    /// Field names to prompt when inserting into the entity, primary key
    /// excluded.
    ///
    /// Relational entities use live column metadata. Document-only
    /// entities use the declared field list, or sample stored documents
    /// when the registry has no entry. Introspection failures degrade to
    /// an empty list.
    pub async fn insert_fields(&self, entity: &LogicalEntity) -> Vec<String> {
        let mut fields = if entity.in_relational {
            match self.relational {
                Some(backend) => match backend.table_columns(&entity.name).await {
                    Ok(columns) => columns.into_iter().map(|c| c.name).collect(),
                    Err(e) => {
                        warn!("schema unavailable for {}: {e}", entity.name);
                        Vec::new()
                    }
                },
                None => Vec::new(),
            }
        } else if entity.in_document {
            match self.registry.document_fields(&entity.name) {
                Some(declared) => declared.to_vec(),
                None => match self.document {
                    Some(backend) => {
                        match backend.sample_fields(&entity.name, SAMPLE_LIMIT).await {
                            Ok(sampled) => sampled,
                            Err(e) => {
                                warn!("schema unavailable for {}: {e}", entity.name);
                                Vec::new()
                            }
                        }
                    }
                    None => Vec::new(),
                },
            }
        } else {
            Vec::new()
        };

        if let Some(pk) = entity.primary_key.as_deref() {
            fields.retain(|name| name != pk);
        }
        fields
    }

    /// Field names to prompt when updating `row`, primary key excluded.
    ///
    /// Relational rows use live column metadata; document rows use their
    /// own stored fields.
    pub async fn update_fields(&self, entity: &LogicalEntity, row: &Row) -> Vec<String> {
        match row {
            Row::Relational { .. } => {
                let mut fields = match self.relational {
                    Some(backend) => match backend.table_columns(&entity.name).await {
                        Ok(columns) => columns.into_iter().map(|c| c.name).collect(),
                        Err(e) => {
                            warn!("schema unavailable for {}: {e}", entity.name);
                            Vec::new()
                        }
                    },
                    None => Vec::new(),
                };
                if let Some(pk) = entity.primary_key.as_deref() {
                    fields.retain(|name| name != pk);
                }
                fields
            }
            Row::Document { .. } => row
                .fields()
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }

    /// Insert one row into the routed backend. `fields` carries only the
    /// values the operator actually supplied; an empty set issues no
    /// statement.
    pub async fn insert(
        &self,
        entity: &LogicalEntity,
        target: BackendKind,
        fields: &[FieldInput],
    ) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        match target {
            BackendKind::Relational => {
                self.relational_required()?
                    .insert(&entity.name, fields)
                    .await
            }
            BackendKind::Document => self.document_required()?.insert(&entity.name, fields).await,
        }
    }

    /// Update one existing row, replacing exactly the supplied fields.
    /// An empty set issues no statement and matches nothing. Returns the
    /// number of rows the key matched.
    pub async fn update(
        &self,
        entity: &LogicalEntity,
        row: &Row,
        fields: &[FieldInput],
    ) -> Result<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        match row.primary_key(&entity.name, entity.primary_key.as_deref())? {
            RowKey::Column(key) => {
                let key_column = self.registered_key(entity)?;
                self.relational_required()?
                    .update(&entity.name, key_column, key, fields)
                    .await
            }
            RowKey::Identity(id) => {
                self.document_required()?
                    .update(&entity.name, id, fields)
                    .await
            }
        }
    }

    /// Delete one existing row keyed by primary key or identity. Returns
    /// the number of rows removed.
    pub async fn delete(&self, entity: &LogicalEntity, row: &Row) -> Result<u64> {
        match row.primary_key(&entity.name, entity.primary_key.as_deref())? {
            RowKey::Column(key) => {
                let key_column = self.registered_key(entity)?;
                self.relational_required()?
                    .delete(&entity.name, key_column, key)
                    .await
            }
            RowKey::Identity(id) => self.document_required()?.delete(&entity.name, id).await,
        }
    }

    fn registered_key<'e>(&self, entity: &'e LogicalEntity) -> Result<&'e str> {
        entity.primary_key.as_deref().ok_or_else(|| {
            StoreError::addressing(&entity.name, "no primary key registered for this entity")
        })
    }
}
