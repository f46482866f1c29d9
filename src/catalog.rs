//! Logical catalog resolution across both backends.
//!
//! An entity is a name-level union: the same name in the relational store
//! and the document store collapses into one logical entity flagged with
//! its presence on each side.

use std::collections::BTreeMap;

use tracing::warn;

use crate::backend::{BackendKind, DocumentBackend, RelationalBackend};
use crate::config::EntityRegistry;

/// One named entity in the merged catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalEntity {
    pub name: String,
    pub in_relational: bool,
    pub in_document: bool,
    /// Declared primary-key field name, if the registry has one.
    pub primary_key: Option<String>,
}

impl LogicalEntity {
    /// True when the entity exists in both backends.
    pub fn dual_homed(&self) -> bool {
        self.in_relational && self.in_document
    }

    /// The single backend holding this entity, or `None` when dual-homed
    /// or absent everywhere.
    pub fn home(&self) -> Option<BackendKind> {
        match (self.in_relational, self.in_document) {
            (true, false) => Some(BackendKind::Relational),
            (false, true) => Some(BackendKind::Document),
            _ => None,
        }
    }
}

/// Merge both backend namespaces into one sorted, deduplicated catalog.
///
/// A listing failure on one side is logged and that side contributes
/// nothing; the other side still resolves.
pub async fn resolve_catalog(
    relational: Option<&dyn RelationalBackend>,
    document: Option<&dyn DocumentBackend>,
    registry: &EntityRegistry,
) -> Vec<LogicalEntity> {
    let mut presence: BTreeMap<String, (bool, bool)> = BTreeMap::new();

    if let Some(backend) = relational {
        match backend.table_names().await {
            Ok(names) => {
                for name in names {
                    presence.entry(name).or_default().0 = true;
                }
            }
            Err(e) => warn!("relational catalog unavailable: {e}"),
        }
    }

    if let Some(backend) = document {
        match backend.collection_names().await {
            Ok(names) => {
                for name in names {
                    presence.entry(name).or_default().1 = true;
                }
            }
            Err(e) => warn!("document catalog unavailable: {e}"),
        }
    }

    presence
        .into_iter()
        .map(|(name, (in_relational, in_document))| {
            let primary_key = registry.primary_key(&name).map(|pk| pk.to_string());
            LogicalEntity {
                name,
                in_relational,
                in_document,
                primary_key,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryDocument, MemoryRelational};

    fn registry() -> EntityRegistry {
        EntityRegistry::default()
    }

    #[tokio::test]
    async fn test_union_is_sorted_and_deduplicated() {
        let relational = MemoryRelational::new();
        relational.add_table("orders", &["order_id"]);
        relational.add_table("customers", &["customer_id"]);
        let document = MemoryDocument::new();
        document.add_collection("user_preferences");
        document.add_collection("customers");

        let catalog = resolve_catalog(Some(&relational), Some(&document), &registry()).await;

        let names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["customers", "orders", "user_preferences"]);

        assert!(catalog[0].dual_homed());
        assert_eq!(catalog[1].home(), Some(BackendKind::Relational));
        assert_eq!(catalog[2].home(), Some(BackendKind::Document));
    }

    #[tokio::test]
    async fn test_failing_side_degrades_to_partial_catalog() {
        let relational = MemoryRelational::new();
        relational.add_table("orders", &["order_id"]);
        relational.set_fail_catalog(true);
        let document = MemoryDocument::new();
        document.add_collection("user_preferences");

        let catalog = resolve_catalog(Some(&relational), Some(&document), &registry()).await;

        let names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["user_preferences"]);
    }

    #[tokio::test]
    async fn test_absent_backends_yield_empty_catalog() {
        let catalog = resolve_catalog(None, None, &registry()).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let relational = MemoryRelational::new();
        relational.add_table("products", &["product_id"]);
        let document = MemoryDocument::new();
        document.add_collection("products");

        let first = resolve_catalog(Some(&relational), Some(&document), &registry()).await;
        let second = resolve_catalog(Some(&relational), Some(&document), &registry()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_primary_key_comes_from_registry() {
        let relational = MemoryRelational::new();
        relational.add_table("customers", &["customer_id"]);
        relational.add_table("scratch", &["k"]);

        let catalog = resolve_catalog(Some(&relational), None, &registry()).await;

        assert_eq!(catalog[0].primary_key.as_deref(), Some("customer_id"));
        assert_eq!(catalog[1].primary_key, None);
    }
}
