//! Resource handlers: routine CRUD around the query pipeline.

pub mod clubs;
pub mod players;
pub mod schemas;

use crate::config::ScoutConfig;
use crate::errors::ScoutError;
use crate::query::{EntitySchema, QueryResolver};
use crate::store::Database;
use crate::utils::json::document_to_json;
use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// What every handler needs: the store and the runtime config.
#[derive(Debug, Clone, Copy)]
pub struct ResourceContext<'a> {
    pub db: &'a Database,
    pub config: &'a ScoutConfig,
}

impl<'a> ResourceContext<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, config: &'a ScoutConfig) -> Self {
        Self { db, config }
    }

    pub(crate) fn resolver(&self, schema: &'static EntitySchema) -> QueryResolver<'a, Database> {
        QueryResolver::new(schema, self.db).with_config(self.config)
    }
}

/// Response body for single-item endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<BsonDocument>,
}

impl ItemResponse {
    #[must_use]
    pub const fn data(data: BsonDocument) -> Self {
        Self { success: true, message: None, data: Some(data) }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()), data: None }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("success".into(), Value::Bool(self.success));
        if let Some(m) = &self.message {
            obj.insert("message".into(), Value::String(m.clone()));
        }
        if let Some(d) = &self.data {
            obj.insert("data".into(), document_to_json(d));
        }
        Value::Object(obj)
    }
}

impl Serialize for ItemResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Deserializes a request body, reporting unknown fields and wrong types as validation errors.
pub(crate) fn from_body<T: for<'de> Deserialize<'de>>(body: &Value) -> Result<T, ScoutError> {
    T::deserialize(body).map_err(|e| ScoutError::Validation(e.to_string()))
}

/// Trimmed text that must not be empty.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ScoutError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ScoutError::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// Lowercase slug, alphanumeric runs joined by single dashes: `"Kujawsko Pomorskie"` -> `"kujawsko-pomorskie"`.
#[must_use]
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
