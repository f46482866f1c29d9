//! In-memory backends for tests.
//!
//! `MemoryRelational` and `MemoryDocument` implement the backend traits over
//! plain maps, with switches to inject failures at each fetch stage. They
//! mirror the observable behavior of the live drivers: a missing table is an
//! execution error on the relational side, while a missing collection reads
//! as empty on the document side.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bson::Bson;

use super::{BackendKind, ColumnInfo, DocumentBackend, FieldInput, RelationalBackend};
use crate::error::{Result, StoreError};
use crate::row::{Row, Value};

#[derive(Debug, Default, Clone)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Relational backend over in-memory tables.
#[derive(Default)]
pub struct MemoryRelational {
    tables: Mutex<BTreeMap<String, MemoryTable>>,
    fail_catalog: AtomicBool,
    fail_schema: AtomicBool,
    fail_execution: AtomicBool,
}

impl MemoryRelational {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&self, name: &str, columns: &[&str]) {
        let mut tables = self.lock();
        tables.insert(
            name.to_string(),
            MemoryTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    pub fn add_row(&self, table: &str, values: Vec<Value>) {
        let mut tables = self.lock();
        if let Some(entry) = tables.get_mut(table) {
            entry.rows.push(values);
        }
    }

    pub fn set_fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_schema(&self, fail: bool) {
        self.fail_schema.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_execution(&self, fail: bool) {
        self.fail_execution.store(fail, Ordering::SeqCst);
    }

    /// Raw rows of one table, for assertions.
    pub fn snapshot(&self, table: &str) -> Vec<Vec<Value>> {
        self.lock()
            .get(table)
            .map(|entry| entry.rows.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MemoryTable>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RelationalBackend for MemoryRelational {
    async fn table_names(&self) -> Result<Vec<String>> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::catalog_fetch(
                BackendKind::Relational,
                "injected catalog failure",
            ));
        }
        Ok(self.lock().keys().cloned().collect())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        if self.fail_schema.load(Ordering::SeqCst) {
            return Err(StoreError::schema_fetch(table, "injected schema failure"));
        }
        let tables = self.lock();
        let Some(entry) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(entry
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnInfo {
                name: name.clone(),
                data_type: "text".to_string(),
                udt_name: "text".to_string(),
                is_nullable: true,
                ordinal_position: i as i32 + 1,
            })
            .collect())
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Relational,
                "injected execution failure",
            ));
        }
        let tables = self.lock();
        let Some(entry) = tables.get(table) else {
            return Err(StoreError::execution(
                BackendKind::Relational,
                format!("relation \"{table}\" does not exist"),
            ));
        };
        Ok(entry
            .rows
            .iter()
            .map(|values| Row::Relational {
                columns: entry.columns.clone(),
                values: values.clone(),
            })
            .collect())
    }

    async fn insert(&self, table: &str, fields: &[FieldInput]) -> Result<()> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Relational,
                "injected execution failure",
            ));
        }
        let mut tables = self.lock();
        let Some(entry) = tables.get_mut(table) else {
            return Err(StoreError::execution(
                BackendKind::Relational,
                format!("relation \"{table}\" does not exist"),
            ));
        };
        for field in fields {
            if !entry.columns.iter().any(|c| c == &field.name) {
                return Err(StoreError::execution(
                    BackendKind::Relational,
                    format!("column \"{}\" does not exist", field.name),
                ));
            }
        }
        let row = entry
            .columns
            .iter()
            .map(|column| {
                fields
                    .iter()
                    .find(|f| &f.name == column)
                    .and_then(|f| f.value.as_ref())
                    .map(|v| Value::Text(v.clone()))
                    .unwrap_or(Value::Null)
            })
            .collect();
        entry.rows.push(row);
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
        fields: &[FieldInput],
    ) -> Result<u64> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Relational,
                "injected execution failure",
            ));
        }
        let mut tables = self.lock();
        let Some(entry) = tables.get_mut(table) else {
            return Err(StoreError::execution(
                BackendKind::Relational,
                format!("relation \"{table}\" does not exist"),
            ));
        };
        let Some(key_index) = entry.columns.iter().position(|c| c == key_column) else {
            return Err(StoreError::execution(
                BackendKind::Relational,
                format!("column \"{key_column}\" does not exist"),
            ));
        };
        let mut assignments = Vec::new();
        for field in fields {
            let Some(index) = entry.columns.iter().position(|c| c == &field.name) else {
                return Err(StoreError::execution(
                    BackendKind::Relational,
                    format!("column \"{}\" does not exist", field.name),
                ));
            };
            let value = field
                .value
                .as_ref()
                .map(|v| Value::Text(v.clone()))
                .unwrap_or(Value::Null);
            assignments.push((index, value));
        }

        let mut affected = 0;
        for row in entry.rows.iter_mut() {
            if row.get(key_index) == Some(key) {
                for (index, value) in &assignments {
                    row[*index] = value.clone();
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete(&self, table: &str, key_column: &str, key: &Value) -> Result<u64> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Relational,
                "injected execution failure",
            ));
        }
        let mut tables = self.lock();
        let Some(entry) = tables.get_mut(table) else {
            return Err(StoreError::execution(
                BackendKind::Relational,
                format!("relation \"{table}\" does not exist"),
            ));
        };
        let Some(key_index) = entry.columns.iter().position(|c| c == key_column) else {
            return Err(StoreError::execution(
                BackendKind::Relational,
                format!("column \"{key_column}\" does not exist"),
            ));
        };
        let before = entry.rows.len();
        entry.rows.retain(|row| row.get(key_index) != Some(key));
        Ok((before - entry.rows.len()) as u64)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// One stored document with its identity in wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Bson,
    pub fields: Vec<(String, Value)>,
}

/// Document backend over in-memory collections.
#[derive(Default)]
pub struct MemoryDocument {
    collections: Mutex<BTreeMap<String, Vec<StoredDocument>>>,
    next_id: AtomicI64,
    fail_catalog: AtomicBool,
    fail_schema: AtomicBool,
    fail_execution: AtomicBool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn add_collection(&self, name: &str) {
        self.lock().entry(name.to_string()).or_default();
    }

    pub fn add_document(&self, collection: &str, id: Bson, fields: Vec<(String, Value)>) {
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument { id, fields });
    }

    pub fn set_fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_schema(&self, fail: bool) {
        self.fail_schema.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_execution(&self, fail: bool) {
        self.fail_execution.store(fail, Ordering::SeqCst);
    }

    /// Stored documents of one collection, for assertions.
    pub fn snapshot(&self, collection: &str) -> Vec<StoredDocument> {
        self.lock().get(collection).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<StoredDocument>>> {
        self.collections.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentBackend for MemoryDocument {
    async fn collection_names(&self) -> Result<Vec<String>> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::catalog_fetch(
                BackendKind::Document,
                "injected catalog failure",
            ));
        }
        Ok(self.lock().keys().cloned().collect())
    }

    async fn sample_fields(&self, collection: &str, limit: usize) -> Result<Vec<String>> {
        if self.fail_schema.load(Ordering::SeqCst) {
            return Err(StoreError::schema_fetch(
                collection,
                "injected schema failure",
            ));
        }
        let collections = self.lock();
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut fields: Vec<String> = Vec::new();
        for document in documents.iter().take(limit) {
            for (name, _) in &document.fields {
                if !fields.iter().any(|f| f == name) {
                    fields.push(name.clone());
                }
            }
        }
        Ok(fields)
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<Row>> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Document,
                "injected execution failure",
            ));
        }
        let collections = self.lock();
        let documents = collections.get(collection).cloned().unwrap_or_default();
        Ok(documents
            .into_iter()
            .map(|doc| Row::Document {
                id: doc.id,
                fields: doc.fields,
            })
            .collect())
    }

    async fn insert(&self, collection: &str, fields: &[FieldInput]) -> Result<()> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Document,
                "injected execution failure",
            ));
        }
        let id = Bson::Int64(self.next_id.fetch_add(1, Ordering::SeqCst));
        let stored = fields
            .iter()
            .filter_map(|f| {
                f.value
                    .as_ref()
                    .map(|v| (f.name.clone(), Value::Text(v.clone())))
            })
            .collect();
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument { id, fields: stored });
        Ok(())
    }

    async fn update(&self, collection: &str, id: &Bson, fields: &[FieldInput]) -> Result<u64> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Document,
                "injected execution failure",
            ));
        }
        let mut collections = self.lock();
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut matched = 0;
        for document in documents.iter_mut() {
            if &document.id != id {
                continue;
            }
            matched += 1;
            for field in fields {
                let Some(value) = &field.value else { continue };
                let value = Value::Text(value.clone());
                match document.fields.iter_mut().find(|(name, _)| name == &field.name) {
                    Some((_, existing)) => *existing = value,
                    None => document.fields.push((field.name.clone(), value)),
                }
            }
        }
        Ok(matched)
    }

    async fn delete(&self, collection: &str, id: &Bson) -> Result<u64> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(StoreError::execution(
                BackendKind::Document,
                "injected execution failure",
            ));
        }
        let mut collections = self.lock();
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|doc| &doc.id != id);
        Ok((before - documents.len()) as u64)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relational_round_trip() {
        let backend = MemoryRelational::new();
        backend.add_table("customers", &["customer_id", "first_name"]);
        backend.add_row(
            "customers",
            vec![Value::Int32(1), Value::Text("Ada".to_string())],
        );

        let rows = backend.fetch_all("customers").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            Row::Relational {
                columns: vec!["customer_id".to_string(), "first_name".to_string()],
                values: vec![Value::Int32(1), Value::Text("Ada".to_string())],
            }
        );
    }

    #[tokio::test]
    async fn test_relational_missing_table_is_execution_error() {
        let backend = MemoryRelational::new();
        let err = backend.fetch_all("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::Execution { .. }));
    }

    #[tokio::test]
    async fn test_relational_insert_fills_missing_columns_with_null() {
        let backend = MemoryRelational::new();
        backend.add_table("customers", &["customer_id", "first_name", "email"]);

        backend
            .insert(
                "customers",
                &[
                    FieldInput::new("customer_id", Some("1".to_string())),
                    FieldInput::new("email", Some("ada@example.com".to_string())),
                ],
            )
            .await
            .unwrap();

        let rows = backend.snapshot("customers");
        assert_eq!(
            rows[0],
            vec![
                Value::Text("1".to_string()),
                Value::Null,
                Value::Text("ada@example.com".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_relational_update_touches_only_supplied_columns() {
        let backend = MemoryRelational::new();
        backend.add_table("customers", &["customer_id", "first_name", "email"]);
        backend.add_row(
            "customers",
            vec![
                Value::Text("1".to_string()),
                Value::Text("Ada".to_string()),
                Value::Text("old@example.com".to_string()),
            ],
        );

        let affected = backend
            .update(
                "customers",
                "customer_id",
                &Value::Text("1".to_string()),
                &[FieldInput::new("email", Some("new@example.com".to_string()))],
            )
            .await
            .unwrap();

        assert_eq!(affected, 1);
        let rows = backend.snapshot("customers");
        assert_eq!(rows[0][1], Value::Text("Ada".to_string()));
        assert_eq!(rows[0][2], Value::Text("new@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_relational_failure_leaves_rows_unchanged() {
        let backend = MemoryRelational::new();
        backend.add_table("customers", &["customer_id"]);
        backend.add_row("customers", vec![Value::Text("1".to_string())]);
        backend.set_fail_execution(true);

        let err = backend
            .delete("customers", "customer_id", &Value::Text("1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Execution { .. }));
        assert_eq!(backend.snapshot("customers").len(), 1);
    }

    #[tokio::test]
    async fn test_document_missing_collection_reads_empty() {
        let backend = MemoryDocument::new();
        assert!(backend.fetch_all("ghost").await.unwrap().is_empty());
        assert!(backend.sample_fields("ghost", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_sample_unions_fields_in_first_seen_order() {
        let backend = MemoryDocument::new();
        backend.add_document(
            "user_preferences",
            Bson::Int64(1),
            vec![
                ("preference_id".to_string(), Value::Int32(1)),
                ("theme".to_string(), Value::Text("dark".to_string())),
            ],
        );
        backend.add_document(
            "user_preferences",
            Bson::Int64(2),
            vec![
                ("preference_id".to_string(), Value::Int32(2)),
                ("language".to_string(), Value::Text("fr".to_string())),
            ],
        );

        let fields = backend.sample_fields("user_preferences", 5).await.unwrap();
        assert_eq!(fields, vec!["preference_id", "theme", "language"]);
    }

    #[tokio::test]
    async fn test_document_update_can_add_new_field() {
        let backend = MemoryDocument::new();
        backend.add_document(
            "user_preferences",
            Bson::Int64(1),
            vec![("theme".to_string(), Value::Text("dark".to_string()))],
        );

        let matched = backend
            .update(
                "user_preferences",
                &Bson::Int64(1),
                &[FieldInput::new("language", Some("fr".to_string()))],
            )
            .await
            .unwrap();

        assert_eq!(matched, 1);
        let docs = backend.snapshot("user_preferences");
        assert_eq!(docs[0].fields.len(), 2);
        assert_eq!(docs[0].fields[1].0, "language");
    }

    #[tokio::test]
    async fn test_document_delete_by_identity() {
        let backend = MemoryDocument::new();
        backend.add_document("orders", Bson::Int64(1), Vec::new());
        backend.add_document("orders", Bson::Int64(2), Vec::new());

        let deleted = backend.delete("orders", &Bson::Int64(1)).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(backend.snapshot("orders").len(), 1);
        assert_eq!(backend.snapshot("orders")[0].id, Bson::Int64(2));
    }
}
