//! Declarative per-entity field metadata driving translation, coercion and population.

use crate::document::ID_FIELD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    /// The document's own id.
    Id,
    /// Id of a document in the named collection.
    Reference(&'static str),
    /// GeoJSON point, only reachable through the radius path.
    GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub path: &'static str,
    pub kind: FieldType,
    pub filterable: bool,
    pub sortable: bool,
}

impl FieldDef {
    /// Filterable and sortable.
    #[must_use]
    pub const fn indexed(path: &'static str, kind: FieldType) -> Self {
        Self { path, kind, filterable: true, sortable: true }
    }

    #[must_use]
    pub const fn filterable(path: &'static str, kind: FieldType) -> Self {
        Self { path, kind, filterable: true, sortable: false }
    }

    /// Selectable only.
    #[must_use]
    pub const fn plain(path: &'static str, kind: FieldType) -> Self {
        Self { path, kind, filterable: false, sortable: false }
    }
}

const ID_DEF: FieldDef = FieldDef::indexed(ID_FIELD, FieldType::Id);

#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub collection: &'static str,
    pub fields: &'static [FieldDef],
    /// Sort applied when the request has none, in `sort=` syntax.
    pub default_sort: &'static str,
}

impl EntitySchema {
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldDef> {
        if path == ID_FIELD {
            return Some(&ID_DEF);
        }
        self.fields.iter().find(|f| f.path == path)
    }

    /// True for declared paths and for parents of declared paths (`location` for `location.city`).
    #[must_use]
    pub fn knows_path(&self, path: &str) -> bool {
        if self.field(path).is_some() {
            return true;
        }
        self.fields
            .iter()
            .any(|f| f.path.strip_prefix(path).is_some_and(|rest| rest.starts_with('.')))
    }

    /// Path of the first GeoPoint field.
    #[must_use]
    pub fn geo_field(&self) -> Option<&'static str> {
        self.fields.iter().find(|f| f.kind == FieldType::GeoPoint).map(|f| f.path)
    }
}
