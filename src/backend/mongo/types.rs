//! BSON conversion into the unified `Value` type.
//!
//! Conversion is one-way and covers payload fields only. The `_id` never
//! passes through it: `document_to_row` lifts the identity out in wire form
//! so update and delete filters can reuse it exactly as stored.

use bson::{Bson, Document};
use rust_decimal::Decimal;

use crate::row::{Row, Value};

/// Convert a BSON value into the unified `Value` type.
pub(crate) fn bson_to_value(bson: Bson) -> Value {
    match bson {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(v) => Value::Bool(v),
        Bson::Int32(v) => Value::Int32(v),
        Bson::Int64(v) => Value::Int64(v),
        Bson::Double(v) => Value::Float64(v),
        Bson::String(v) => Value::Text(v),
        Bson::ObjectId(v) => Value::ObjectId(v),
        Bson::DateTime(v) => Value::DateTimeTz(v.to_chrono()),
        Bson::Decimal128(v) => v
            .to_string()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .unwrap_or_else(|_| Value::Other {
                type_name: "decimal128".to_string(),
                display: v.to_string(),
            }),
        Bson::Binary(v) => Value::Bytes(v.bytes),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_value).collect()),
        Bson::Document(doc) => Value::Json(Bson::Document(doc).into()),
        other => {
            let type_name = format!("{:?}", other.element_type());
            Value::Other {
                type_name,
                display: other.to_string(),
            }
        }
    }
}

/// Split a fetched document into identity and payload fields.
///
/// The identity stays raw BSON, so a filter built from it matches the
/// stored document whether `_id` is an ObjectId, a subtyped Binary, a
/// Decimal128 or a compound document.
pub(crate) fn document_to_row(mut doc: Document) -> Row {
    let id = doc.remove("_id").unwrap_or(Bson::Null);
    let fields = doc
        .into_iter()
        .map(|(name, bson)| (name, bson_to_value(bson)))
        .collect();

    Row::Document { id, fields }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bson::oid::ObjectId;
    use bson::spec::BinarySubtype;
    use bson::Binary;

    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(bson_to_value(Bson::Null), Value::Null);
        assert_eq!(bson_to_value(Bson::Int32(7)), Value::Int32(7));
        assert_eq!(bson_to_value(Bson::Int64(-2)), Value::Int64(-2));
        assert_eq!(bson_to_value(Bson::Double(1.5)), Value::Float64(1.5));
        assert_eq!(
            bson_to_value(Bson::String("dark".to_string())),
            Value::Text("dark".to_string())
        );
    }

    #[test]
    fn test_object_id_conversion() {
        let oid = ObjectId::new();
        assert_eq!(bson_to_value(Bson::ObjectId(oid)), Value::ObjectId(oid));
    }

    #[test]
    fn test_array_conversion() {
        let value = bson_to_value(Bson::Array(vec![Bson::Int32(1), Bson::Int32(2)]));
        assert_eq!(value, Value::Array(vec![Value::Int32(1), Value::Int32(2)]));
    }

    #[test]
    fn test_nested_document_becomes_json() {
        let value = bson_to_value(Bson::Document(doc! { "theme": "dark" }));
        match value {
            Value::Json(json) => assert_eq!(json["theme"], "dark"),
            other => panic!("expected json value, got {other:?}"),
        }
    }

    #[test]
    fn test_document_to_row_splits_identity() {
        let oid = ObjectId::new();
        let row = document_to_row(doc! {
            "_id": oid,
            "preference_id": 3,
            "theme": "dark",
        });

        match &row {
            Row::Document { id, fields } => {
                assert_eq!(*id, Bson::ObjectId(oid));
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].0, "preference_id");
                assert_eq!(fields[1].0, "theme");
            }
            other => panic!("expected document row, got {other:?}"),
        }
    }

    #[test]
    fn test_document_without_identity() {
        let row = document_to_row(doc! { "theme": "light" });
        match &row {
            Row::Document { id, .. } => assert_eq!(*id, Bson::Null),
            other => panic!("expected document row, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_keeps_binary_subtype() {
        let uuid = Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: vec![0x11; 16],
        });
        let row = document_to_row(doc! { "_id": uuid.clone(), "theme": "dark" });
        match &row {
            Row::Document { id, .. } => assert_eq!(*id, uuid),
            other => panic!("expected document row, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_keeps_decimal128() {
        let price: bson::Decimal128 = "7.25".parse().unwrap();
        let row = document_to_row(doc! { "_id": price, "theme": "dark" });
        match &row {
            Row::Document { id, .. } => assert_eq!(*id, Bson::Decimal128(price)),
            other => panic!("expected document row, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_keeps_compound_document() {
        let compound = doc! { "region": "eu", "seq": 4 };
        let row = document_to_row(doc! { "_id": compound.clone(), "theme": "dark" });
        match &row {
            Row::Document { id, .. } => assert_eq!(*id, Bson::Document(compound)),
            other => panic!("expected document row, got {other:?}"),
        }
    }
}
