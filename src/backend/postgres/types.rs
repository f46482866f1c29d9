//! PostgreSQL type conversion and statement-building utilities.
//!
//! This module handles conversion from PostgreSQL rows (via SQLx) to the
//! unified `Value` type, plus the small SQL helpers the driver composes
//! statements from: identifier quoting, server-side cast expressions for
//! operator-supplied text, and typed parameter binding for fetched values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as SqlxRow, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::backend::ColumnInfo;
use crate::row::{Row, Value};

/// Converter for PostgreSQL values to the unified `Value` type.
pub(crate) struct PgValueConverter;

impl PgValueConverter {
    /// Convert a PostgreSQL row into a tagged relational row.
    pub(crate) fn convert_row(pg_row: &PgRow) -> Row {
        let columns = pg_row
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        let values = pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Self::extract_value(pg_row, col.type_info().name(), idx))
            .collect();

        Row::Relational { columns, values }
    }

    /// Extract a value from a row at the given column index.
    fn extract_value(row: &PgRow, type_name: &str, index: usize) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its PostgreSQL type name.
    fn decode_by_type(row: &PgRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            "INT2" | "SMALLINT" | "SMALLSERIAL" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .unwrap_or(Value::Null),

            "INT4" | "INT" | "INTEGER" | "SERIAL" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "INT8" | "BIGINT" | "BIGSERIAL" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            "FLOAT4" | "REAL" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "FLOAT8" | "DOUBLE PRECISION" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "NUMERIC" | "DECIMAL" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or(Value::Null),

            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BYTEA" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(Value::Date)
                .unwrap_or(Value::Null),

            "TIME" | "TIMETZ" => row
                .try_get::<NaiveTime, _>(index)
                .map(Value::Time)
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMPTZ" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .unwrap_or(Value::Null),

            "UUID" => row
                .try_get::<Uuid, _>(index)
                .map(Value::Uuid)
                .unwrap_or(Value::Null),

            "JSON" | "JSONB" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            "_INT4" | "INT4[]" => row
                .try_get::<Vec<i32>, _>(index)
                .map(|arr| Value::Array(arr.into_iter().map(Value::Int32).collect()))
                .unwrap_or(Value::Null),

            "_INT8" | "INT8[]" => row
                .try_get::<Vec<i64>, _>(index)
                .map(|arr| Value::Array(arr.into_iter().map(Value::Int64).collect()))
                .unwrap_or(Value::Null),

            "_TEXT" | "TEXT[]" | "_VARCHAR" | "VARCHAR[]" => row
                .try_get::<Vec<String>, _>(index)
                .map(|arr| Value::Array(arr.into_iter().map(Value::Text).collect()))
                .unwrap_or(Value::Null),

            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    /// Fallback: try to decode as a string representation for unknown types.
    fn decode_as_string_fallback(row: &PgRow, index: usize, type_name: &str) -> Value {
        if let Ok(s) = row.try_get::<String, _>(index) {
            return Value::Other {
                type_name: type_name.to_string(),
                display: s,
            };
        }

        if let Ok(v) = row.try_get::<i64, _>(index) {
            return Value::Other {
                type_name: type_name.to_string(),
                display: v.to_string(),
            };
        }

        if let Ok(v) = row.try_get::<f64, _>(index) {
            return Value::Other {
                type_name: type_name.to_string(),
                display: v.to_string(),
            };
        }

        Value::Other {
            type_name: type_name.to_string(),
            display: "<unknown>".to_string(),
        }
    }
}

/// Quote an identifier for interpolation into a statement.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Placeholder expression for one operator-supplied field.
///
/// Supplied values travel as text and are cast server-side to the column's
/// introspected type, so PostgreSQL's own parser is the single source of
/// coercion truth. Columns without introspected metadata get a bare
/// placeholder.
pub(crate) fn cast_expr(column: Option<&ColumnInfo>, placeholder: usize) -> String {
    let Some(column) = column else {
        return format!("${placeholder}");
    };
    let target = match column.data_type.as_str() {
        "ARRAY" => format!("{}[]", column.udt_name.trim_start_matches('_')),
        "USER-DEFINED" => quote_ident(&column.udt_name),
        _ => column.data_type.clone(),
    };
    format!("${placeholder}::{target}")
}

/// Bind a fetched `Value` as a typed parameter.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::Int16(v) => query.bind(*v),
        Value::Int32(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::Float32(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        Value::Bytes(v) => query.bind(v.clone()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
        Value::DateTimeTz(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
        Value::Json(v) => query.bind(v.clone()),
        other => query.bind(other.to_display_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("customers"), "\"customers\"");
        assert_eq!(quote_ident("odd name"), "\"odd name\"");
        assert_eq!(quote_ident("qu\"ote"), "\"qu\"\"ote\"");
    }

    #[test]
    fn test_cast_expr_plain_types() {
        let int_col = ColumnInfo {
            name: "customer_id".to_string(),
            data_type: "integer".to_string(),
            udt_name: "int4".to_string(),
            is_nullable: false,
            ordinal_position: 1,
        };
        assert_eq!(cast_expr(Some(&int_col), 1), "$1::integer");

        let varchar_col = ColumnInfo {
            name: "email".to_string(),
            data_type: "character varying".to_string(),
            udt_name: "varchar".to_string(),
            is_nullable: true,
            ordinal_position: 2,
        };
        assert_eq!(cast_expr(Some(&varchar_col), 3), "$3::character varying");
    }

    #[test]
    fn test_cast_expr_user_defined() {
        let enum_col = ColumnInfo {
            name: "status".to_string(),
            data_type: "USER-DEFINED".to_string(),
            udt_name: "order_status".to_string(),
            is_nullable: false,
            ordinal_position: 5,
        };
        assert_eq!(cast_expr(Some(&enum_col), 2), "$2::\"order_status\"");
    }

    #[test]
    fn test_cast_expr_array() {
        let arr_col = ColumnInfo {
            name: "tags".to_string(),
            data_type: "ARRAY".to_string(),
            udt_name: "_text".to_string(),
            is_nullable: true,
            ordinal_position: 4,
        };
        assert_eq!(cast_expr(Some(&arr_col), 1), "$1::text[]");
    }

    #[test]
    fn test_cast_expr_unknown_column() {
        assert_eq!(cast_expr(None, 7), "$7");
    }
}
