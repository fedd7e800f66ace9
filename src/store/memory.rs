use crate::document::Document;
use crate::errors::ScoutError;
use crate::query::eval::{compare_docs, eval_filter, get_path, project_fields};
use crate::query::{CmpOp, Filter, FindOptions};
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;

use super::Collection;

/// Outcome of a write that must keep one field unique across the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum UniqueWrite {
    Written(BsonDocument),
    /// Another document already holds the value.
    Conflict,
    /// The target of an update does not exist.
    Missing,
}

/// Insertion-ordered in-memory collection. Unsorted reads return insertion order and
/// sorted reads are stable, so ties keep insertion order too.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: RwLock::new(Vec::new()) }
    }

    /// Stores an already-identified document, replacing any document with the same id.
    pub fn insert_document(&self, doc: Document) {
        let mut docs = self.docs.write();
        if let Some(existing) = docs.iter_mut().find(|d| d.id == doc.id) {
            *existing = doc;
        } else {
            docs.push(doc);
        }
    }

    /// Inserts `data` unless another document holds the same value at `field`.
    /// The check and the push happen under one write lock.
    #[must_use]
    pub fn insert_unique(&self, data: BsonDocument, field: &str) -> UniqueWrite {
        let doc = Document::new(data);
        let mut docs = self.docs.write();
        if clashes(&docs, &doc, field) {
            return UniqueWrite::Conflict;
        }
        let stored = doc.data.clone();
        docs.push(doc);
        UniqueWrite::Written(stored)
    }

    /// `update_fields` that refuses to give `field` a value another document already holds.
    #[must_use]
    pub fn update_unique(&self, id: &DocumentId, set: &[(String, Bson)], field: &str) -> UniqueWrite {
        let mut docs = self.docs.write();
        let Some(pos) = docs.iter().position(|d| &d.id == id) else { return UniqueWrite::Missing };
        let mut candidate = docs[pos].clone();
        apply_set(&mut candidate, set);
        if clashes(&docs, &candidate, field) {
            return UniqueWrite::Conflict;
        }
        let stored = candidate.data.clone();
        docs[pos] = candidate;
        UniqueWrite::Written(stored)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Stored body of one document, unprojected.
    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<BsonDocument> {
        self.docs.read().iter().find(|d| &d.id == id).map(|d| d.data.clone())
    }

    fn find_sync(&self, filter: &Filter, opts: &FindOptions) -> Vec<BsonDocument> {
        let docs = self.docs.read();
        let mut matched: Vec<&BsonDocument> =
            docs.iter().map(|d| &d.data).filter(|d| eval_filter(d, filter)).collect();
        if !opts.sort.is_empty() {
            matched.sort_by(|a, b| compare_docs(a, b, &opts.sort));
        }
        let limit = opts.limit.unwrap_or(usize::MAX);
        matched
            .into_iter()
            .skip(opts.skip)
            .take(limit)
            .map(|d| match &opts.projection {
                Some(fields) if !fields.is_empty() => project_fields(d, fields),
                _ => d.clone(),
            })
            .collect()
    }
}

/// True when a document other than `doc` holds `doc`'s value at `field`.
fn clashes(docs: &[Document], doc: &Document, field: &str) -> bool {
    let Some(value) = get_path(&doc.data, field) else { return false };
    let same = Filter::Cmp { path: field.to_string(), op: CmpOp::Eq, value: value.clone() };
    docs.iter().any(|d| d.id != doc.id && eval_filter(&d.data, &same))
}

fn set_path(root: &mut BsonDocument, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            root.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(root.get(head), Some(Bson::Document(_))) {
                root.insert(head, BsonDocument::new());
            }
            if let Some(Bson::Document(child)) = root.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}

fn apply_set(doc: &mut Document, set: &[(String, Bson)]) {
    let mut data = doc.data.clone();
    for (path, value) in set {
        set_path(&mut data, path, value.clone());
    }
    doc.update(data);
}

impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<BsonDocument>, ScoutError> {
        Ok(self.find_sync(filter, opts))
    }

    async fn count(&self, filter: &Filter) -> Result<usize, ScoutError> {
        Ok(self.docs.read().iter().filter(|d| eval_filter(&d.data, filter)).count())
    }

    async fn find_by_id(
        &self,
        id: &DocumentId,
        projection: Option<&[String]>,
    ) -> Result<Option<BsonDocument>, ScoutError> {
        let docs = self.docs.read();
        Ok(docs.iter().find(|d| &d.id == id).map(|d| match projection {
            Some(fields) if !fields.is_empty() => project_fields(&d.data, fields),
            _ => d.data.clone(),
        }))
    }

    async fn insert(&self, data: BsonDocument) -> Result<BsonDocument, ScoutError> {
        let doc = Document::new(data);
        let stored = doc.data.clone();
        self.docs.write().push(doc);
        log::debug!("inserted into {}: {}", self.name, stored.get_str("_id").unwrap_or_default());
        Ok(stored)
    }

    async fn update_fields(
        &self,
        id: &DocumentId,
        set: Vec<(String, Bson)>,
    ) -> Result<Option<BsonDocument>, ScoutError> {
        let mut docs = self.docs.write();
        let Some(doc) = docs.iter_mut().find(|d| &d.id == id) else { return Ok(None) };
        apply_set(doc, &set);
        Ok(Some(doc.data.clone()))
    }

    async fn update_many(&self, filter: &Filter, set: Vec<(String, Bson)>) -> Result<usize, ScoutError> {
        let mut docs = self.docs.write();
        let mut touched = 0usize;
        for doc in docs.iter_mut().filter(|d| eval_filter(&d.data, filter)) {
            apply_set(doc, &set);
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete(&self, id: &DocumentId) -> Result<bool, ScoutError> {
        let mut docs = self.docs.write();
        let before = docs.len();
        docs.retain(|d| &d.id != id);
        Ok(docs.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Order, SortKey};
    use bson::doc;

    fn seeded() -> MemoryCollection {
        let col = MemoryCollection::new("people");
        for (name, age) in [("alice", 30), ("bob", 40), ("carol", 35), ("dave", 30)] {
            col.insert_document(Document::new(doc! {"name": name, "age": age}));
        }
        col
    }

    #[tokio::test]
    async fn find_sort_project_paginate() {
        let col = seeded();
        let filter = Filter::Cmp { path: "age".into(), op: CmpOp::Gt, value: 30.into() };
        let opts = FindOptions {
            projection: Some(vec!["name".into()]),
            sort: vec![SortKey { field: "age".into(), order: Order::Desc }],
            skip: 0,
            limit: Some(2),
        };
        let docs = col.find(&filter, &opts).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get_str("name").unwrap(), "bob");
        assert_eq!(docs[1].get_str("name").unwrap(), "carol");
        assert!(docs[0].get("age").is_none());
        assert!(docs[0].get("_id").is_some());
        assert_eq!(col.count(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let col = seeded();
        let opts = FindOptions { sort: vec![SortKey { field: "age".into(), order: Order::Asc }], ..Default::default() };
        let names: Vec<String> = col
            .find(&Filter::True, &opts)
            .await
            .unwrap()
            .iter()
            .map(|d| d.get_str("name").unwrap().to_string())
            .collect();
        assert_eq!(names, ["alice", "dave", "carol", "bob"]);
    }

    #[tokio::test]
    async fn skip_past_end_is_empty() {
        let col = seeded();
        let opts = FindOptions { skip: 10, limit: Some(5), ..Default::default() };
        assert!(col.find(&Filter::True, &opts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_paths() {
        let col = MemoryCollection::new("clubs");
        let stored = col.insert(doc! {"name": "Warta"}).await.unwrap();
        let id: DocumentId = stored.get_str("_id").unwrap().parse().unwrap();
        let updated = col
            .update_fields(&id, vec![("location.city".into(), "Poznan".into())])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_document("location").unwrap().get_str("city").unwrap(), "Poznan");
        assert_eq!(updated.get_str("name").unwrap(), "Warta");
        assert_eq!(col.update_many(&Filter::True, vec![("league".into(), "II".into())]).await.unwrap(), 1);
        assert!(col.delete(&id).await.unwrap());
        assert!(!col.delete(&id).await.unwrap());
        assert!(col.update_fields(&id, Vec::new()).await.unwrap().is_none());
    }

    #[test]
    fn unique_writes() {
        let col = MemoryCollection::new("clubs");
        let UniqueWrite::Written(lech) = col.insert_unique(doc! {"name": "Lech"}, "name") else {
            panic!("first insert must succeed")
        };
        assert!(matches!(col.insert_unique(doc! {"name": "Warta"}, "name"), UniqueWrite::Written(_)));
        assert_eq!(col.insert_unique(doc! {"name": "Lech"}, "name"), UniqueWrite::Conflict);
        assert_eq!(col.len(), 2);

        let id: DocumentId = lech.get_str("_id").unwrap().parse().unwrap();
        let rename = |to: &str| vec![("name".to_string(), Bson::String(to.to_string()))];
        assert_eq!(col.update_unique(&id, &rename("Warta"), "name"), UniqueWrite::Conflict);
        assert!(matches!(col.update_unique(&id, &rename("Lech"), "name"), UniqueWrite::Written(_)));
        assert!(matches!(col.update_unique(&id, &rename("Lech Poznan"), "name"), UniqueWrite::Written(_)));
        assert_eq!(col.update_unique(&DocumentId::new(), &rename("x"), "name"), UniqueWrite::Missing);
        assert_eq!(col.get(&id).unwrap().get_str("name").unwrap(), "Lech Poznan");
    }
}
