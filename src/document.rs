use crate::errors::ScoutError;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use chrono::Utc;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A stored record. `data` always carries the id under `_id` so reads can return it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
}

impl Document {
    /// Wraps fresh data, assigning a new id and a `createdAt` timestamp.
    #[must_use]
    pub fn new(data: BsonDocument) -> Self {
        let id = DocumentId::new();
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, id.to_string());
        for (k, v) in data {
            if k != ID_FIELD {
                out.insert(k, v);
            }
        }
        if !out.contains_key(CREATED_AT_FIELD) {
            out.insert(CREATED_AT_FIELD, Bson::DateTime(now()));
        }
        Self { id, data: out }
    }

    /// Wraps data that may already carry an `_id` (fixtures, imports). A missing id is generated.
    ///
    /// # Errors
    /// Returns a validation error when `_id` is present but not a valid id string.
    pub fn from_stored(data: BsonDocument) -> Result<Self, ScoutError> {
        match data.get(ID_FIELD) {
            None => Ok(Self::new(data)),
            Some(Bson::String(s)) => {
                let id: DocumentId = s.parse()?;
                let mut data = data;
                data.insert(ID_FIELD, id.to_string());
                Ok(Self { id, data })
            }
            Some(other) => Err(ScoutError::Validation(format!("invalid _id value {other}"))),
        }
    }

    /// Replace the body while keeping the id and creation stamp.
    pub fn update(&mut self, new_data: BsonDocument) {
        let created = self.data.get(CREATED_AT_FIELD).cloned();
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, self.id.to_string());
        for (k, v) in new_data {
            if k != ID_FIELD {
                out.insert(k, v);
            }
        }
        if let Some(c) = created
            && !out.contains_key(CREATED_AT_FIELD)
        {
            out.insert(CREATED_AT_FIELD, c);
        }
        self.data = out;
    }
}

fn now() -> bson::DateTime {
    bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn new_assigns_id_and_created_at() {
        let d = Document::new(doc! {"name": "Lech Poznan", "_id": "ignored"});
        assert_eq!(d.data.get_str(ID_FIELD).unwrap(), d.id.to_string());
        assert!(d.data.get_datetime(CREATED_AT_FIELD).is_ok());
        assert_eq!(d.data.keys().next().map(String::as_str), Some(ID_FIELD));
    }

    #[test]
    fn from_stored_keeps_given_id() {
        let id = DocumentId::new();
        let d = Document::from_stored(doc! {"_id": id.to_string(), "name": "x"}).unwrap();
        assert_eq!(d.id, id);
        assert!(Document::from_stored(doc! {"_id": 5}).is_err());
        assert!(Document::from_stored(doc! {"_id": "nope"}).is_err());
    }

    #[test]
    fn update_preserves_identity() {
        let mut d = Document::new(doc! {"name": "a"});
        let created = d.data.get(CREATED_AT_FIELD).cloned();
        d.update(doc! {"name": "b"});
        assert_eq!(d.data.get_str("name").unwrap(), "b");
        assert_eq!(d.data.get(CREATED_AT_FIELD).cloned(), created);
        assert_eq!(d.data.get_str(ID_FIELD).unwrap(), d.id.to_string());
    }
}
