//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Records are serialized with serde first, so every model keeps its
//! camelCase field names remotely as well.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Number, Value};

use crate::remote::error::RemoteError;

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect())
}

pub fn decode_value(value: &Value) -> Result<Value, RemoteError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(RemoteError::Parse(format!("Not a Firestore value: {}", value)));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or(false))),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| RemoteError::Parse(format!("Invalid integerValue: {}", inner)))
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| RemoteError::Parse(format!("Invalid doubleValue: {}", inner))),
        "stringValue" | "timestampValue" | "referenceValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            let decoded = values
                .map(|vals| vals.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(decoded))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(RemoteError::Parse(format!("Unsupported Firestore type: {}", other))),
    }
}

/// Decodes a document's `fields`. A document without fields decodes to `{}`.
pub fn decode_fields(fields: &Value) -> Result<Value, RemoteError> {
    if fields.is_null() {
        return Ok(Value::Object(Map::new()));
    }
    let Some(map) = fields.as_object() else {
        return Err(RemoteError::Parse("Document fields must be an object".to_string()));
    };
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

/// Serializes a record into a Firestore `fields` object.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Value, RemoteError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(encode_fields(&map)),
        other => Err(RemoteError::Parse(format!("Expected an object, got {}", other))),
    }
}

pub fn from_fields<T: DeserializeOwned>(fields: &Value) -> Result<T, RemoteError> {
    Ok(serde_json::from_value(decode_fields(fields)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;

    #[test]
    fn test_scalar_encoding() {
        assert_eq!(encode_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode_value(&json!(8.5)), json!({ "doubleValue": 8.5 }));
        assert_eq!(encode_value(&json!("EURUSD")), json!({ "stringValue": "EURUSD" }));
        assert_eq!(encode_value(&json!(null)), json!({ "nullValue": null }));
    }

    #[test]
    fn test_nested_document() {
        let doc = json!({
            "values": [100, 500],
            "settings": { "balance": 1000.5, "tp": 5, "sl": 3 }
        });
        let fields = encode_fields(doc.as_object().unwrap());
        assert_eq!(fields["values"]["arrayValue"]["values"][1], json!({ "integerValue": "500" }));
        assert_eq!(
            fields["settings"]["mapValue"]["fields"]["balance"],
            json!({ "doubleValue": 1000.5 })
        );
        assert_eq!(decode_fields(&fields).unwrap(), doc);
    }

    #[test]
    fn test_decode_timestamp_and_empty_array() {
        let fields = json!({
            "updatedAt": { "timestampValue": "2024-06-10T08:00:00Z" },
            "values": { "arrayValue": {} }
        });
        let decoded = decode_fields(&fields).unwrap();
        assert_eq!(decoded["updatedAt"], "2024-06-10T08:00:00Z");
        assert_eq!(decoded["values"], json!([]));
    }

    #[test]
    fn test_integer_settings_decode_as_floats() {
        let fields = json!({
            "balance": { "integerValue": "1000" },
            "tp": { "integerValue": "5" },
            "sl": { "doubleValue": 2.5 }
        });
        let settings: Settings = from_fields(&fields).unwrap();
        assert_eq!(settings.balance, 1000.0);
        assert_eq!(settings.sl, 2.5);
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(decode_value(&json!({ "geoPointValue": {} })).is_err());
        assert!(decode_value(&json!("bare")).is_err());
    }
}
