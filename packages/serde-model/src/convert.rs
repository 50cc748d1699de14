//! Conversions between `Value` and serde types.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use docmodel_core::Value;

use crate::Error;

/// Deserialize a Rust type out of a `Value`.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    Ok(serde_json::from_value(value_to_json(value))?)
}

/// Serialize a Rust type into a `Value`.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value, Error> {
    Ok(json_to_value(serde_json::to_value(data)?))
}

/// `Value` to JSON. Bytes become base64 strings; non-finite floats become
/// `null`.
pub fn value_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Bytes(b) => {
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(&b))
        }
        Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

/// JSON to `Value`.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                // arbitrary-precision numbers
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Address {
        street: String,
        #[serde(default)]
        zip: Option<u32>,
    }

    #[test]
    fn roundtrip_struct() {
        let original = Address {
            street: "Main".to_string(),
            zip: Some(12345),
        };
        let value = to_value(&original).unwrap();
        assert_eq!(value.field("street"), Some(&Value::from("Main")));
        let recovered: Address = from_value(value).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn json_numbers() {
        let value = json_to_value(serde_json::json!({ "i": 42, "f": 2.75, "n": -100 }));
        assert_eq!(value.field("i"), Some(&Value::Integer(42)));
        assert_eq!(value.field("n"), Some(&Value::Integer(-100)));
        match value.field("f") {
            Some(Value::Float(f)) => assert!((f - 2.75).abs() < 0.001),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn huge_unsigned_becomes_float() {
        assert!(matches!(
            json_to_value(serde_json::json!(u64::MAX)),
            Value::Float(_)
        ));
    }

    #[test]
    fn nan_becomes_null() {
        assert_eq!(value_to_json(Value::Float(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn bytes_are_base64() {
        let json = value_to_json(Value::Bytes(vec![1, 2, 3, 4]));
        let encoded = json.as_str().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4]);
    }

    #[test]
    fn nested_structure() {
        let json = serde_json::json!({ "tags": ["a", "b"], "meta": { "done": false } });
        let value = json_to_value(json.clone());
        assert_eq!(
            value.field("tags"),
            Some(&Value::from(vec!["a", "b"]))
        );
        assert_eq!(value_to_json(value), json);
    }

    #[test]
    fn from_value_shape_error() {
        let result: Result<Address, _> = from_value(Value::from("not a struct"));
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
