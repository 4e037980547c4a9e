//! Identifier encoding and decoding
//!
//! Single-column keys pass the column value through unchanged. Compound keys
//! are carried as a JSON array string of the key values in key order, e.g.
//! `"[1,10]"` for `(tenant_id, item_id)`.

use serde_json::Value;

use pgrest_common::error::{Error, Result};
use pgrest_common::types::{Identifier, Record};

use crate::key::PrimaryKey;

/// Name of the field the front end reads the identifier from
pub const ID_FIELD: &str = "id";

/// Encode the key columns of `record` into an identifier.
///
/// Missing columns encode as `null`.
pub fn encode(record: &Record, key: &PrimaryKey) -> Identifier {
    match key {
        PrimaryKey::Simple(column) => record.get(column).cloned().unwrap_or(Value::Null),
        PrimaryKey::Compound(columns) => {
            let values: Vec<Value> = columns
                .iter()
                .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                .collect();
            Value::String(Value::Array(values).to_string())
        }
    }
}

/// Decode an identifier into the ordered key values.
///
/// # Errors
/// Returns `MalformedIdentifier` when a compound identifier is not a JSON
/// array or its length differs from the number of key columns.
pub fn decode(identifier: &Identifier, key: &PrimaryKey) -> Result<Vec<Value>> {
    match key {
        PrimaryKey::Simple(_) => Ok(vec![Value::String(to_plain_string(identifier))]),
        PrimaryKey::Compound(columns) => {
            let values = match identifier {
                Value::Array(values) => values.clone(),
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(values)) => values,
                    _ => {
                        return Err(Error::MalformedIdentifier(format!(
                            "'{s}' is not a JSON array"
                        )))
                    }
                },
                other => {
                    return Err(Error::MalformedIdentifier(format!(
                        "{other} is not a compound identifier"
                    )))
                }
            };

            if values.len() != columns.len() {
                return Err(Error::MalformedIdentifier(format!(
                    "{identifier} has {} values, key {key} has {} columns",
                    values.len(),
                    columns.len()
                )));
            }

            Ok(values)
        }
    }
}

/// Return `record` carrying an `id` field the front end can use.
///
/// A record keyed by a natural `id` column is returned unchanged when it
/// already has one; every other record gets `id = encode(record, key)`.
pub fn attach_identifier(mut record: Record, key: &PrimaryKey) -> Record {
    if let PrimaryKey::Simple(column) = key {
        if column == ID_FIELD && record.contains_key(ID_FIELD) {
            return record;
        }
    }

    let id = encode(&record, key);
    record.insert(ID_FIELD.to_string(), id);
    record
}

/// Key column values for a write payload.
///
/// Values present in `record` win; the rest come from the decoded `identifier`.
///
/// # Errors
/// Returns `MalformedIdentifier` if a value must be taken from an identifier
/// that does not decode.
pub fn key_data(record: &Record, identifier: &Identifier, key: &PrimaryKey) -> Result<Record> {
    let mut data = Record::new();

    match key {
        PrimaryKey::Simple(column) => {
            let value = record
                .get(column)
                .cloned()
                .unwrap_or_else(|| identifier.clone());
            data.insert(column.clone(), value);
        }
        PrimaryKey::Compound(columns) => {
            if columns.iter().all(|c| record.contains_key(c)) {
                for column in columns {
                    data.insert(column.clone(), record[column].clone());
                }
            } else {
                let decoded = decode(identifier, key)?;
                for (column, value) in columns.iter().zip(decoded) {
                    let value = record.get(column).cloned().unwrap_or(value);
                    data.insert(column.clone(), value);
                }
            }
        }
    }

    Ok(data)
}

/// String form of a JSON value without the quotes around strings
pub fn to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn compound() -> PrimaryKey {
        PrimaryKey::Compound(vec!["tenant_id".to_string(), "item_id".to_string()])
    }

    #[test]
    fn test_encode_simple_passes_value_through() {
        let row = record(json!({ "id": 42, "title": "hello" }));
        assert_eq!(encode(&row, &PrimaryKey::simple("id")), json!(42));

        let row = record(json!({ "uuid": "a-b-c" }));
        assert_eq!(encode(&row, &PrimaryKey::simple("uuid")), json!("a-b-c"));
    }

    #[test]
    fn test_encode_compound_in_key_order() {
        let row = record(json!({ "item_id": 10, "name": "bolt", "tenant_id": 1 }));
        assert_eq!(encode(&row, &compound()), json!("[1,10]"));
    }

    #[test]
    fn test_encode_missing_column_is_null() {
        let row = record(json!({ "tenant_id": 1 }));
        assert_eq!(encode(&row, &compound()), json!("[1,null]"));
        assert_eq!(encode(&row, &PrimaryKey::simple("id")), Value::Null);
    }

    #[test]
    fn test_compound_round_trip() {
        let row = record(json!({ "tenant_id": "acme", "item_id": 7, "qty": 3 }));
        let id = encode(&row, &compound());
        let decoded = decode(&id, &compound()).unwrap();
        assert_eq!(decoded, vec![json!("acme"), json!(7)]);
    }

    #[test]
    fn test_decode_simple_is_string_form() {
        let key = PrimaryKey::simple("id");
        assert_eq!(decode(&json!(123), &key).unwrap(), vec![json!("123")]);
        assert_eq!(decode(&json!("abc"), &key).unwrap(), vec![json!("abc")]);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = decode(&json!("[1,2,3]"), &compound()).unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier(_)));
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode(&json!("not json"), &compound()).is_err());
        assert!(decode(&json!("{\"a\":1}"), &compound()).is_err());
        assert!(decode(&json!(5), &compound()).is_err());
    }

    #[test]
    fn test_decode_accepts_array_value() {
        assert_eq!(
            decode(&json!([1, 2]), &compound()).unwrap(),
            vec![json!(1), json!(2)]
        );
    }

    #[test]
    fn test_attach_keeps_natural_id() {
        let row = record(json!({ "id": 5, "title": "x" }));
        let out = attach_identifier(row.clone(), &PrimaryKey::simple("id"));
        assert_eq!(out, row);
    }

    #[test]
    fn test_attach_simple_non_id_key() {
        let row = record(json!({ "uuid": "u-1", "title": "x" }));
        let out = attach_identifier(row, &PrimaryKey::simple("uuid"));
        assert_eq!(out["id"], json!("u-1"));
        assert_eq!(out["uuid"], json!("u-1"));
    }

    #[test]
    fn test_attach_compound_always_synthesizes() {
        let row = record(json!({ "id": 99, "tenant_id": 1, "item_id": 10 }));
        let out = attach_identifier(row, &compound());
        assert_eq!(out["id"], json!("[1,10]"));
    }

    #[test]
    fn test_key_data_prefers_record_values() {
        let row = record(json!({ "tenant_id": 2, "item_id": 20, "qty": 1 }));
        let data = key_data(&row, &json!("[1,10]"), &compound()).unwrap();
        assert_eq!(Value::Object(data), json!({ "tenant_id": 2, "item_id": 20 }));
    }

    #[test]
    fn test_key_data_falls_back_to_identifier() {
        let row = record(json!({ "qty": 1 }));
        let data = key_data(&row, &json!("[1,10]"), &compound()).unwrap();
        assert_eq!(Value::Object(data), json!({ "tenant_id": 1, "item_id": 10 }));

        let data = key_data(&row, &json!(7), &PrimaryKey::simple("id")).unwrap();
        assert_eq!(Value::Object(data), json!({ "id": 7 }));
    }
}
