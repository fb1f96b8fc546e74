//! # Records and Collection Names
//!
//! A [`Record`] is an opaque JSON object. The store never looks inside it: no
//! field is required, no field is interpreted. The only structural rule is that
//! a record is an object (`{...}`), never a bare scalar or array.
//!
//! Collection names double as document keys in storage backends (the file
//! backend turns `events` into `events.json`), so they are restricted to a
//! portable character set. See [`validate_collection_name`].

use crate::error::{ModelDataError, Result};
use serde_json::{Map, Value};

/// A single schema-less record: field name to JSON value.
pub type Record = Map<String, Value>;

pub const MAX_NAME_LEN: usize = 128;

/// Parse a record from JSON text, rejecting anything that is not an object.
pub fn parse_record(input: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(input)? {
        Value::Object(map) => Ok(map),
        other => Err(ModelDataError::Malformed(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Convert a parsed document into a record sequence.
/// The document must be an array whose every element is an object.
pub fn records_from_value(doc: Value) -> Result<Vec<Record>> {
    let items = match doc {
        Value::Array(items) => items,
        other => {
            return Err(ModelDataError::Malformed(format!(
                "expected an array of records, got {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(ModelDataError::Malformed(format!(
                "record {} is {}, not an object",
                i,
                kind_of(&other)
            ))),
        })
        .collect()
}

/// Check that a collection name is usable as a storage key.
///
/// Accepts ASCII alphanumerics, `-`, `_` and `.`, not starting with `.`,
/// between 1 and [`MAX_NAME_LEN`] bytes.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(ModelDataError::InvalidName(name.to_string()))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_object_records() {
        let record = parse_record(r#"{"name": "A", "size": 3}"#).unwrap();
        assert_eq!(record.get("name"), Some(&json!("A")));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn rejects_non_object_records() {
        for input in ["[1, 2]", "\"text\"", "42", "null"] {
            match parse_record(input) {
                Err(ModelDataError::Malformed(msg)) => {
                    assert!(msg.contains("expected a JSON object"))
                }
                other => panic!("expected Malformed for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_record("{name: A"),
            Err(ModelDataError::Serialization(_))
        ));
    }

    #[test]
    fn document_must_be_array_of_objects() {
        let records = records_from_value(json!([{"name": "A"}, {}])).unwrap();
        assert_eq!(records.len(), 2);

        let err = records_from_value(json!({"events": []})).unwrap_err();
        assert!(err.to_string().contains("expected an array"));

        let err = records_from_value(json!([{"name": "A"}, "B"])).unwrap_err();
        assert!(err.to_string().contains("record 1 is a string"));
    }

    #[test]
    fn collection_names() {
        for ok in ["congregations", "events", "circuit-events", "sce_v2", "a.b"] {
            assert!(validate_collection_name(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", ".hidden", "../etc", "a/b", "a\\b", "white space", "ünï"] {
            assert!(
                matches!(
                    validate_collection_name(bad),
                    Err(ModelDataError::InvalidName(_))
                ),
                "{bad} should be rejected"
            );
        }
        assert!(validate_collection_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_collection_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }
}
