use crate::utils::json::document_to_json;
use bson::Document as BsonDocument;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use super::paginate::Pagination;

/// Response body for list endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub success: bool,
    /// Items in this page.
    pub count: usize,
    /// Documents matching the filter across all pages.
    pub total: usize,
    pub pagination: Pagination,
    pub data: Vec<BsonDocument>,
}

impl ResultEnvelope {
    #[must_use]
    pub fn new(data: Vec<BsonDocument>, total: usize, pagination: Pagination) -> Self {
        Self { success: true, count: data.len(), total, pagination, data }
    }

    /// A complete, unpaginated listing.
    #[must_use]
    pub fn unpaged(data: Vec<BsonDocument>) -> Self {
        let total = data.len();
        Self::new(data, total, Pagination::default())
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "success": self.success,
            "count": self.count,
            "total": self.total,
            "pagination": self.pagination,
            "data": self.data.iter().map(document_to_json).collect::<Vec<_>>(),
        })
    }
}

impl Serialize for ResultEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
