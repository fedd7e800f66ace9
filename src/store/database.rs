use crate::document::Document;
use crate::errors::ScoutError;
use crate::query::ReferenceLookup;
use crate::types::{CollectionName, DocumentId};
use crate::utils::json::json_to_document;
use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Collection, MemoryCollection};

/// Named in-memory collections; also resolves references for population.
#[derive(Debug, Default)]
pub struct Database {
    collections: RwLock<HashMap<CollectionName, Arc<MemoryCollection>>>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named collection, creating it when missing.
    pub fn create_collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone()
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<Arc<MemoryCollection>> {
        self.collections.read().get(name).cloned()
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Loads `{ "<collection>": [ {..}, .. ], .. }`. Documents may carry their own `_id`.
    /// Returns the number of documents loaded.
    ///
    /// # Errors
    /// Returns a validation error for a malformed dataset or an invalid `_id`.
    pub fn load_json(&self, dataset: &serde_json::Value) -> Result<usize, ScoutError> {
        let obj = dataset
            .as_object()
            .ok_or_else(|| ScoutError::validation("dataset must map collection names to arrays"))?;
        let mut loaded = 0usize;
        for (name, items) in obj {
            let items = items
                .as_array()
                .ok_or_else(|| ScoutError::Validation(format!("dataset entry '{name}' is not an array")))?;
            let col = self.create_collection(name);
            for item in items {
                col.insert_document(Document::from_stored(json_to_document(item)?)?);
                loaded += 1;
            }
            log::info!("loaded {} documents into {name}", items.len());
        }
        Ok(loaded)
    }
}

impl ReferenceLookup for Database {
    async fn lookup(
        &self,
        collection: &str,
        id: &str,
        select: &[String],
    ) -> Result<Option<BsonDocument>, ScoutError> {
        // A collection nothing was ever stored in holds no referents.
        let Some(col) = self.collection(collection) else { return Ok(None) };
        let Ok(id) = id.parse::<DocumentId>() else { return Ok(None) };
        col.find_by_id(&id, Some(select)).await
    }
}
