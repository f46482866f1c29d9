//! Backend-agnostic row and value types.
//!
//! This module contains:
//! - `Value` - A unified value type covering both backends' scalar types
//! - `Row` - A tagged row that knows which backend shape it came from
//!
//! Rows from the relational backend carry their column names alongside the
//! values; rows from the document store carry the backend-assigned identity
//! apart from the ordered field map, in its wire form so filters built from
//! it match the stored `_id` whatever its BSON type. Downstream code
//! addresses rows only through the `primary_key` and `fields` capability
//! methods.

use bson::oid::ObjectId;
use bson::Bson;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// A unified value type that can represent any value either backend produces.
///
/// This enum provides a common representation for values from PostgreSQL and
/// MongoDB, enabling backend-agnostic row handling and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value (true/false)
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date without time
    Date(NaiveDate),
    /// Time without date
    Time(NaiveTime),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Date and time with timezone (stored as UTC)
    DateTimeTz(DateTime<Utc>),
    /// Decimal/numeric with arbitrary precision
    Decimal(Decimal),
    /// UUID
    Uuid(Uuid),
    /// JSON value (relational json/jsonb and embedded documents)
    Json(serde_json::Value),
    /// Document-store object identity
    ObjectId(ObjectId),
    /// Array of values
    Array(Vec<Value>),
    /// Backend-specific type that doesn't map to a standard type.
    /// Contains the type name and a string representation for display.
    Other {
        /// The backend-specific type name
        type_name: String,
        /// String representation for display
        display: String,
    },
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert this value to a display string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::DateTimeTz(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f %Z").to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Json(j) => serde_json::to_string(j).unwrap_or_else(|_| "{}".to_string()),
            Value::ObjectId(id) => id.to_hex(),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_display_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Other { display, .. } => display.clone(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// The value that addresses one row, shaped for the backend that owns it.
///
/// Relational keys are unified values bound into SQL statements; document
/// identities stay in wire form for exact `_id` filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowKey<'a> {
    /// Relational primary-key value, resolved by column name.
    Column(&'a Value),
    /// Document identity, exactly as stored.
    Identity(&'a Bson),
}

/// A row fetched from one of the two backends.
///
/// The variant records which backend shape the row has, so update and delete
/// paths can key it correctly without re-querying where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Row {
    /// Relational row: parallel ordered column names and values.
    Relational {
        columns: Vec<String>,
        values: Vec<Value>,
    },
    /// Document row: the backend-assigned identity held apart from the
    /// ordered field map, untouched by value conversion.
    Document {
        id: Bson,
        fields: Vec<(String, Value)>,
    },
}

impl Row {
    /// Resolve the value that addresses this row.
    ///
    /// Relational rows look the registered primary-key column up by name in
    /// their own column list. Document rows return the stored identity in
    /// wire form; update and delete filters reuse it verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Addressing`] when no primary key is registered
    /// for the entity, the named column is absent from the row, or a
    /// document row carries no identity.
    pub fn primary_key(&self, entity: &str, primary_key: Option<&str>) -> Result<RowKey<'_>> {
        match self {
            Row::Relational { columns, values } => {
                let name = primary_key.ok_or_else(|| {
                    StoreError::addressing(entity, "no primary key registered")
                })?;
                let index = columns.iter().position(|c| c == name).ok_or_else(|| {
                    StoreError::addressing(
                        entity,
                        format!("primary key column {name} not present in row"),
                    )
                })?;
                values.get(index).map(RowKey::Column).ok_or_else(|| {
                    StoreError::addressing(
                        entity,
                        format!("row carries no value for primary key column {name}"),
                    )
                })
            }
            Row::Document { id, .. } => {
                if matches!(id, Bson::Null) {
                    return Err(StoreError::addressing(entity, "document has no identity"));
                }
                Ok(RowKey::Identity(id))
            }
        }
    }

    /// The row's fields as ordered name/value pairs.
    ///
    /// The document identity is not a field and never appears here.
    pub fn fields(&self) -> Vec<(&str, &Value)> {
        match self {
            Row::Relational { columns, values } => columns
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
            Row::Document { fields, .. } => fields
                .iter()
                .map(|(name, value)| (name.as_str(), value))
                .collect(),
        }
    }

    /// Number of fields in this row.
    pub fn len(&self) -> usize {
        match self {
            Row::Relational { values, .. } => values.len(),
            Row::Document { fields, .. } => fields.len(),
        }
    }

    /// Check if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
