// Firestore REST typed values -> plain JSON.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };

    if obj.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(v) = obj.get("integerValue") {
        // int64 values travel as strings.
        return match v {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or_else(|_| v.clone()),
            other => other.clone(),
        };
    }
    if let Some(map) = obj.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(|f| f.as_object())
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }
    if let Some(array) = obj.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(|v| v.as_array())
            .map(|values| values.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    for key in [
        "stringValue",
        "booleanValue",
        "doubleValue",
        "timestampValue",
        "referenceValue",
        "bytesValue",
        "geoPointValue",
    ] {
        if let Some(v) = obj.get(key) {
            return v.clone();
        }
    }
    Value::Null
}

pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Accepts RFC 3339 strings or integer epoch seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    pub id: String,
    pub collection: String,
    // Id of the document owning the collection, absent for root collections.
    pub parent_id: Option<String>,
}

/// Splits `projects/p/databases/d/documents/users/alice/servers/s1`.
pub fn parse_document_name(name: &str) -> Option<DocumentPath> {
    let (_, path) = name.split_once("/documents/")?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 || segments.len() % 2 != 0 {
        return None;
    }
    let n = segments.len();
    Some(DocumentPath {
        id: segments[n - 1].to_string(),
        collection: segments[n - 2].to_string(),
        parent_id: (n >= 4).then(|| segments[n - 3].to_string()),
    })
}
