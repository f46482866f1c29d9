//! Configuration file support.
//!
//! Loads the session configuration from TOML: one descriptor per backend,
//! the per-entity registry (declared primary keys and document field lists),
//! and the initial insert-routing target. There are no command-line flags;
//! the file is found through `$STORECTL_CONFIG` or the platform config
//! directory, and built-in defaults cover the storefront deployment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// Environment variable naming an explicit configuration file path.
pub const CONFIG_ENV: &str = "STORECTL_CONFIG";

/// Which backend receives the first insert into a dual-homed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingMode {
    #[default]
    DocumentFirst,
    RelationalFirst,
}

impl RoutingMode {
    /// The backend the first dual-homed insert routes to.
    pub fn initial_target(self) -> BackendKind {
        match self {
            RoutingMode::DocumentFirst => BackendKind::Document,
            RoutingMode::RelationalFirst => BackendKind::Relational,
        }
    }
}

/// PostgreSQL connection descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_relational_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_user")]
    pub password: String,
    #[serde(default = "default_relational_database")]
    pub database: String,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_relational_port(),
            user: default_user(),
            password: default_user(),
            database: default_relational_database(),
        }
    }
}

/// MongoDB connection descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_document_port")]
    pub port: u16,
    #[serde(default = "default_document_database")]
    pub database: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_document_port(),
            database: default_document_database(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_relational_port() -> u16 {
    5432
}

fn default_document_port() -> u16 {
    27017
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_relational_database() -> String {
    "store_db".to_string()
}

fn default_document_database() -> String {
    "data_intensive_systems".to_string()
}

/// Registry entry for one entity: its declared primary-key field and, for
/// document-homed entities, the declared field list used when prompting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub document_fields: Option<Vec<String>>,
}

impl EntityEntry {
    /// Entry declaring only a primary key.
    pub fn keyed(primary_key: &str) -> Self {
        Self {
            primary_key: Some(primary_key.to_string()),
            document_fields: None,
        }
    }

    /// Entry declaring a primary key and a document field list.
    pub fn keyed_with_fields(primary_key: &str, fields: &[&str]) -> Self {
        Self {
            primary_key: Some(primary_key.to_string()),
            document_fields: Some(fields.iter().map(|f| f.to_string()).collect()),
        }
    }
}

/// Per-entity registry of primary keys and document field lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRegistry {
    entries: BTreeMap<String, EntityEntry>,
}

impl EntityRegistry {
    pub fn new(entries: BTreeMap<String, EntityEntry>) -> Self {
        Self { entries }
    }

    /// A registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The declared primary-key field name for an entity, if registered.
    pub fn primary_key(&self, entity: &str) -> Option<&str> {
        self.entries
            .get(entity)
            .and_then(|e| e.primary_key.as_deref())
    }

    /// The declared document field list for an entity, if registered.
    pub fn document_fields(&self, entity: &str) -> Option<&[String]> {
        self.entries
            .get(entity)
            .and_then(|e| e.document_fields.as_deref())
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "customers".to_string(),
            EntityEntry::keyed_with_fields(
                "customer_id",
                &["customer_id", "first_name", "last_name", "email", "created_date"],
            ),
        );
        entries.insert("categories".to_string(), EntityEntry::keyed("category_id"));
        entries.insert(
            "products".to_string(),
            EntityEntry::keyed_with_fields(
                "product_id",
                &[
                    "product_id",
                    "product_name",
                    "description",
                    "price",
                    "stock_quantity",
                    "category_id",
                ],
            ),
        );
        entries.insert(
            "orders".to_string(),
            EntityEntry::keyed_with_fields(
                "order_id",
                &["order_id", "customer_id", "order_date", "total_amount", "status"],
            ),
        );
        entries.insert(
            "order_items".to_string(),
            EntityEntry::keyed("order_item_id"),
        );
        entries.insert(
            "product_reviews".to_string(),
            EntityEntry::keyed_with_fields(
                "review_id",
                &[
                    "review_id",
                    "product_id",
                    "customer_id",
                    "rating",
                    "review_text",
                    "review_date",
                ],
            ),
        );
        entries.insert(
            "user_preferences".to_string(),
            EntityEntry::keyed_with_fields(
                "preference_id",
                &["preference_id", "customer_id", "theme", "language"],
            ),
        );
        Self { entries }
    }
}

/// Complete session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub routing: RoutingMode,
    #[serde(default)]
    pub relational: RelationalConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub entities: EntityRegistry,
}

impl StoreConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Loads the configuration for this session.
    ///
    /// Resolution order:
    /// 1. `$STORECTL_CONFIG` (must name a readable file)
    /// 2. `<config_dir>/storectl/config.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Returns the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("storectl").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_descriptors() {
        let config = StoreConfig::default();
        assert_eq!(config.relational.host, "localhost");
        assert_eq!(config.relational.port, 5432);
        assert_eq!(config.relational.database, "store_db");
        assert_eq!(config.document.port, 27017);
        assert_eq!(config.document.database, "data_intensive_systems");
        assert_eq!(config.routing, RoutingMode::DocumentFirst);
    }

    #[test]
    fn test_default_registry() {
        let registry = EntityRegistry::default();
        assert_eq!(registry.primary_key("customers"), Some("customer_id"));
        assert_eq!(registry.primary_key("order_items"), Some("order_item_id"));
        assert_eq!(registry.primary_key("widgets"), None);

        let fields = registry.document_fields("user_preferences").unwrap();
        assert_eq!(fields, &["preference_id", "customer_id", "theme", "language"]);
        assert!(registry.document_fields("categories").is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            routing = "relational-first"

            [relational]
            host = "db.example.com"
            port = 5433
            user = "maint"
            password = "secret"
            database = "store_db"

            [document]
            host = "docs.example.com"
            database = "store_docs"

            [entities.widgets]
            primary_key = "widget_id"
            document_fields = ["widget_id", "name"]
        "#;

        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.routing, RoutingMode::RelationalFirst);
        assert_eq!(config.relational.host, "db.example.com");
        assert_eq!(config.relational.port, 5433);
        assert_eq!(config.document.host, "docs.example.com");
        // Missing keys fall back per field.
        assert_eq!(config.document.port, 27017);
        assert_eq!(config.entities.primary_key("widgets"), Some("widget_id"));
        assert_eq!(
            config.entities.document_fields("widgets").unwrap(),
            &["widget_id", "name"]
        );
        // A file that declares entities replaces the built-in registry.
        assert_eq!(config.entities.primary_key("customers"), None);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[relational]\ndatabase = \"other_db\"\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.relational.database, "other_db");
        assert_eq!(config.relational.host, "localhost");
    }

    #[test]
    fn test_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        assert!(StoreConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_routing_initial_target() {
        assert_eq!(
            RoutingMode::DocumentFirst.initial_target(),
            BackendKind::Document
        );
        assert_eq!(
            RoutingMode::RelationalFirst.initial_target(),
            BackendKind::Relational
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = StoreConfig::default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("storectl/config.toml"));
    }
}
