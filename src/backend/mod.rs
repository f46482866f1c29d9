//! Backend driver traits and shared metadata types.
//!
//! This module defines the two driver traits the rest of the crate works
//! against:
//!
//! - **`RelationalBackend`** - the PostgreSQL side: live schema
//!   introspection, parameterized statements, transactional mutations
//! - **`DocumentBackend`** - the MongoDB side: collection listing, field
//!   sampling, identity-keyed mutations
//!
//! Both traits are object safe; the connection manager holds them as boxed
//! trait objects so in-memory doubles can stand in during tests.

use async_trait::async_trait;
use bson::Bson;

use crate::error::Result;
use crate::row::{Row, Value};

pub mod memory;
pub mod mongo;
pub mod postgres;

pub use memory::{MemoryDocument, MemoryRelational};
pub use mongo::MongoConnection;
pub use postgres::PostgresConnection;

/// The two backend roles behind the unified catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Relational,
    Document,
}

impl BackendKind {
    /// The other backend.
    pub fn opposite(self) -> Self {
        match self {
            BackendKind::Relational => BackendKind::Document,
            BackendKind::Document => BackendKind::Relational,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Relational => write!(f, "relational"),
            BackendKind::Document => write!(f, "document"),
        }
    }
}

/// Column metadata from relational schema introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared data type (`information_schema` spelling, e.g. `integer`)
    pub data_type: String,
    /// Underlying type name, used when `data_type` is `USER-DEFINED` or `ARRAY`
    pub udt_name: String,
    /// Whether the column allows NULL values
    pub is_nullable: bool,
    /// Column position (1-indexed, as reported by the catalog)
    pub ordinal_position: i32,
}

impl ColumnInfo {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            udt_name: data_type.to_string(),
            is_nullable: true,
            ordinal_position: 0,
        }
    }
}

/// One operator-supplied field for an insert or update.
///
/// `None` means the operator skipped the prompt; relational statements bind
/// NULL for skipped insert fields, and update paths omit the field entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    pub name: String,
    pub value: Option<String>,
}

impl FieldInput {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Driver interface for the relational backend.
///
/// Implementations map their driver errors into the crate taxonomy at each
/// method boundary: `CatalogFetch` for namespace listing, `SchemaFetch` for
/// introspection, `Execution` for statements.
#[async_trait]
pub trait RelationalBackend: Send + Sync {
    /// Table names in the working schema.
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Live column metadata for one table. Unknown tables yield an empty
    /// list, not an error.
    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Every row of the table, in the backend's native order.
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>>;

    /// Insert one row naming exactly the supplied columns.
    async fn insert(&self, table: &str, fields: &[FieldInput]) -> Result<()>;

    /// Update the row keyed by `key_column = key`, setting exactly the
    /// supplied fields. Runs inside a transaction; a failed statement rolls
    /// back before the error is returned. Returns the matched-row count.
    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
        fields: &[FieldInput],
    ) -> Result<u64>;

    /// Delete the row keyed by `key_column = key` inside a transaction.
    /// Returns the removed-row count.
    async fn delete(&self, table: &str, key_column: &str, key: &Value) -> Result<u64>;

    /// Release the connection handle.
    async fn close(&self) -> Result<()>;
}

/// Driver interface for the document backend.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Collection names in the database.
    async fn collection_names(&self) -> Result<Vec<String>>;

    /// Field names discovered by sampling up to `limit` documents, in
    /// first-seen order, identity field excluded.
    async fn sample_fields(&self, collection: &str, limit: usize) -> Result<Vec<String>>;

    /// Every document of the collection. Unknown collections are empty.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Row>>;

    /// Insert one document holding the supplied fields as entered.
    async fn insert(&self, collection: &str, fields: &[FieldInput]) -> Result<()>;

    /// Set exactly the supplied fields on the document with this identity.
    /// The identity is the stored `_id` in wire form; the filter must match
    /// it exactly, Binary subtypes and all. Returns the matched count.
    async fn update(&self, collection: &str, id: &Bson, fields: &[FieldInput]) -> Result<u64>;

    /// Remove the document with this identity. Returns the removed count.
    async fn delete(&self, collection: &str, id: &Bson) -> Result<u64>;

    /// Release the client handle.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_opposite() {
        assert_eq!(BackendKind::Relational.opposite(), BackendKind::Document);
        assert_eq!(BackendKind::Document.opposite(), BackendKind::Relational);
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Relational.to_string(), "relational");
        assert_eq!(BackendKind::Document.to_string(), "document");
    }

    #[test]
    fn test_field_input() {
        let supplied = FieldInput::new("email", Some("ada@example.com".to_string()));
        assert_eq!(supplied.name, "email");
        assert_eq!(supplied.value.as_deref(), Some("ada@example.com"));

        let skipped = FieldInput::new("email", None);
        assert!(skipped.value.is_none());
    }

    #[test]
    fn test_column_info_new() {
        let col = ColumnInfo::new("price", "numeric");
        assert_eq!(col.name, "price");
        assert_eq!(col.data_type, "numeric");
        assert_eq!(col.udt_name, "numeric");
        assert!(col.is_nullable);
    }
}
