//! Error taxonomy for store operations.
//!
//! Every backend-facing call maps its driver error into one of these
//! variants at its own boundary, so raw `sqlx` or `mongodb` errors never
//! reach the presentation layer.

use thiserror::Error;

use crate::backend::BackendKind;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// All failures a store operation can surface.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A backend could not be reached or refused the session.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Listing the namespace of one backend failed. Callers degrade to an
    /// empty contribution from that backend rather than aborting.
    #[error("catalog fetch failed on {backend} backend: {message}")]
    CatalogFetch {
        backend: BackendKind,
        message: String,
    },

    /// Column or field introspection failed. Callers degrade to an empty
    /// schema rather than aborting.
    #[error("schema fetch failed for {entity}: {message}")]
    SchemaFetch { entity: String, message: String },

    /// A row could not be keyed, either because no primary key is
    /// registered for the entity or the key is absent from the row.
    #[error("cannot address row in {entity}: {message}")]
    Addressing { entity: String, message: String },

    /// A statement was issued and the backend rejected it.
    #[error("{backend} execution failed: {message}")]
    Execution {
        backend: BackendKind,
        message: String,
    },

    /// Operator input did not name a valid menu, entity or row number.
    #[error("invalid selection: {input}")]
    InvalidSelection { input: String },

    /// The named entity exists in neither backend.
    #[error("entity {name} not found in any backend")]
    EntityNotFound { name: String },
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        StoreError::Connection {
            message: message.into(),
        }
    }

    pub fn catalog_fetch(backend: BackendKind, source: impl std::fmt::Display) -> Self {
        StoreError::CatalogFetch {
            backend,
            message: source.to_string(),
        }
    }

    pub fn schema_fetch(entity: impl Into<String>, source: impl std::fmt::Display) -> Self {
        StoreError::SchemaFetch {
            entity: entity.into(),
            message: source.to_string(),
        }
    }

    pub fn addressing(entity: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Addressing {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn execution(backend: BackendKind, source: impl std::fmt::Display) -> Self {
        StoreError::Execution {
            backend,
            message: source.to_string(),
        }
    }

    pub fn invalid_selection(input: impl Into<String>) -> Self {
        StoreError::InvalidSelection {
            input: input.into(),
        }
    }

    pub fn entity_not_found(name: impl Into<String>) -> Self {
        StoreError::EntityNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_display() {
        let err = StoreError::connection("PostgreSQL at localhost:5432/store_db: timed out");
        assert_eq!(
            err.to_string(),
            "connection failed: PostgreSQL at localhost:5432/store_db: timed out"
        );
    }

    #[test]
    fn test_catalog_fetch_names_backend() {
        let err = StoreError::catalog_fetch(BackendKind::Document, "server selection timeout");
        assert_eq!(
            err.to_string(),
            "catalog fetch failed on document backend: server selection timeout"
        );
    }

    #[test]
    fn test_addressing_display() {
        let err = StoreError::addressing("order_items", "no primary key registered");
        assert_eq!(
            err.to_string(),
            "cannot address row in order_items: no primary key registered"
        );
    }

    #[test]
    fn test_execution_names_backend() {
        let err = StoreError::execution(BackendKind::Relational, "duplicate key value");
        assert_eq!(
            err.to_string(),
            "relational execution failed: duplicate key value"
        );
    }

    #[test]
    fn test_invalid_selection_display() {
        let err = StoreError::invalid_selection("abc");
        assert_eq!(err.to_string(), "invalid selection: abc");
    }

    #[test]
    fn test_entity_not_found_display() {
        let err = StoreError::entity_not_found("ghost");
        assert_eq!(err.to_string(), "entity ghost not found in any backend");
    }
}
