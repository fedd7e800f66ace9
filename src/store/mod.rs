//! Collection abstraction consumed by the query pipeline, plus the in-memory implementation.

mod database;
mod memory;

pub use database::Database;
pub use memory::{MemoryCollection, UniqueWrite};

use crate::errors::ScoutError;
use crate::query::{Filter, FindOptions};
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use std::future::Future;

/// A named set of documents. Reads are the pipeline's only suspension points.
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Filtered, sorted, paginated, projected read.
    fn find(
        &self,
        filter: &Filter,
        opts: &FindOptions,
    ) -> impl Future<Output = Result<Vec<BsonDocument>, ScoutError>> + Send;

    fn count(&self, filter: &Filter) -> impl Future<Output = Result<usize, ScoutError>> + Send;

    fn find_by_id(
        &self,
        id: &DocumentId,
        projection: Option<&[String]>,
    ) -> impl Future<Output = Result<Option<BsonDocument>, ScoutError>> + Send;

    /// Stores a new document and returns it as stored (with `_id` and `createdAt`).
    fn insert(&self, data: BsonDocument) -> impl Future<Output = Result<BsonDocument, ScoutError>> + Send;

    /// Sets the given top-level or dotted fields on one document; `None` when it does not exist.
    fn update_fields(
        &self,
        id: &DocumentId,
        set: Vec<(String, Bson)>,
    ) -> impl Future<Output = Result<Option<BsonDocument>, ScoutError>> + Send;

    /// Sets fields on every matching document and returns how many were touched.
    fn update_many(
        &self,
        filter: &Filter,
        set: Vec<(String, Bson)>,
    ) -> impl Future<Output = Result<usize, ScoutError>> + Send;

    fn delete(&self, id: &DocumentId) -> impl Future<Output = Result<bool, ScoutError>> + Send;
}
