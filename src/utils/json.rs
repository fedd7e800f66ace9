use crate::errors::ScoutError;
use bson::{Bson, Document as BsonDocument};
use serde_json::{Map, Number, Value};

/// Convert a JSON value into BSON. Integers that fit stay `Int64`, other numbers become `Double`.
#[must_use]
pub fn json_to_bson(val: &Value) -> Bson {
    match val {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => n.as_i64().map_or_else(|| Bson::Double(n.as_f64().unwrap_or(f64::NAN)), Bson::Int64),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(obj) => Bson::Document(map_to_document(obj)),
    }
}

fn map_to_document(obj: &Map<String, Value>) -> BsonDocument {
    let mut out = BsonDocument::new();
    for (k, v) in obj {
        out.insert(k.clone(), json_to_bson(v));
    }
    out
}

/// Convert a JSON value that must be an object into a BSON document.
///
/// # Errors
/// Returns a validation error when the value is not an object.
pub fn json_to_document(val: &Value) -> Result<BsonDocument, ScoutError> {
    val.as_object()
        .map(map_to_document)
        .ok_or_else(|| ScoutError::validation("expected JSON object"))
}

/// Render BSON as plain JSON for responses: dates become RFC 3339 strings, object ids hex strings.
#[must_use]
pub fn bson_to_json(val: &Bson) -> Value {
    match val {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(d) => document_to_json(d),
        Bson::DateTime(dt) => {
            dt.try_to_rfc3339_string().map_or_else(|_| Value::from(dt.timestamp_millis()), Value::String)
        }
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => Value::String(other.to_string()),
    }
}

#[must_use]
pub fn document_to_json(doc: &BsonDocument) -> Value {
    let mut obj = Map::new();
    for (k, v) in doc {
        obj.insert(k.clone(), bson_to_json(v));
    }
    Value::Object(obj)
}

/// Parse a JSON string into a BSON document. The JSON must be a top-level object.
///
/// # Errors
/// Returns an error for malformed JSON or a non-object top level.
pub fn parse_json_to_document(json: &str) -> Result<BsonDocument, ScoutError> {
    let val: Value = serde_json::from_str(json)?;
    json_to_document(&val)
}
