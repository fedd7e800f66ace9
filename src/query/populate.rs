//! Expansion of reference fields into embedded sub-documents on the response copy.

use crate::errors::ScoutError;
use bson::{Bson, Document as BsonDocument};
use std::collections::HashMap;
use std::future::Future;

use super::eval::get_path;
use super::schema::{EntitySchema, FieldType};

/// Fetches one referenced document, projected to `select` (plus `_id`). `Ok(None)` for a dangling id.
pub trait ReferenceLookup: Send + Sync {
    fn lookup(
        &self,
        collection: &str,
        id: &str,
        select: &[String],
    ) -> impl Future<Output = Result<Option<BsonDocument>, ScoutError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateField {
    pub path: String,
    /// Sub-fields revealed from the referenced document; empty reveals all of them.
    pub select: Vec<String>,
}

/// Reference fields to expand, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateSpec {
    fields: Vec<PopulateField>,
}

impl PopulateSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, path: &str, select: &[&str]) -> Self {
        self.fields.push(PopulateField {
            path: path.to_string(),
            select: select.iter().map(|s| (*s).to_string()).collect(),
        });
        self
    }

    /// Parses `club:name,website;order:status`. A path without `:` reveals every field.
    ///
    /// # Errors
    /// Returns a validation error for an empty path or empty selected field.
    pub fn parse(raw: &str) -> Result<Self, ScoutError> {
        let mut spec = Self::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (path, select) = entry.split_once(':').unwrap_or((entry, ""));
            let path = path.trim();
            if path.is_empty() {
                return Err(ScoutError::Validation(format!("empty populate path in '{raw}'")));
            }
            let mut fields = Vec::new();
            if !select.trim().is_empty() {
                for f in select.split(',').map(str::trim) {
                    if f.is_empty() {
                        return Err(ScoutError::Validation(format!("empty populate field in '{raw}'")));
                    }
                    fields.push(f.to_string());
                }
            }
            spec.fields.push(PopulateField { path: path.to_string(), select: fields });
        }
        Ok(spec)
    }

    #[must_use]
    pub fn fields(&self) -> &[PopulateField] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Pairs each entry with its target collection.
    ///
    /// # Errors
    /// Returns a validation error when a path is not a declared reference field.
    pub fn targets(&self, schema: &EntitySchema) -> Result<Vec<(&PopulateField, &'static str)>, ScoutError> {
        self.fields
            .iter()
            .map(|f| match schema.field(&f.path).map(|d| d.kind) {
                Some(FieldType::Reference(target)) => Ok((f, target)),
                _ => Err(ScoutError::Validation(format!(
                    "'{}' is not a reference field of {}",
                    f.path, schema.name
                ))),
            })
            .collect()
    }
}

/// Replaces each declared reference with the referenced document, or `null` when it dangles.
/// Works on the fetched copies only. Fields absent from a document stay absent.
///
/// # Errors
/// Returns a validation error for undeclared paths and propagates lookup failures unchanged.
pub async fn populate<L: ReferenceLookup>(
    docs: Vec<BsonDocument>,
    spec: &PopulateSpec,
    schema: &EntitySchema,
    lookup: &L,
) -> Result<Vec<BsonDocument>, ScoutError> {
    let targets = spec.targets(schema)?;
    let mut docs = docs;
    for (field, target) in targets {
        let mut resolved: HashMap<String, Option<BsonDocument>> = HashMap::new();
        for doc in &mut docs {
            let Some(current) = get_path(doc, &field.path) else { continue };
            let expanded = match current {
                Bson::String(id) => {
                    if !resolved.contains_key(id) {
                        let found = lookup.lookup(target, id, &field.select).await?;
                        if found.is_none() {
                            log::warn!("dangling reference {}={id} into {target}", field.path);
                        }
                        resolved.insert(id.clone(), found);
                    }
                    resolved.get(id).cloned().flatten().map_or(Bson::Null, Bson::Document)
                }
                Bson::Null => Bson::Null,
                other => {
                    log::warn!("reference {} holds a non-id value {other}", field.path);
                    Bson::Null
                }
            };
            set_path(doc, &field.path, expanded);
        }
    }
    Ok(docs)
}

fn set_path(doc: &mut BsonDocument, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(child)) = doc.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}
