use crate::errors::ScoutError;
use crate::query::geo::GeoPoint;
use bson::Bson;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;

/// Query-string keys consumed by the translator instead of becoming filters.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub order: Order,
}

/// Ordered sort keys; earlier keys take priority, ties fall through to later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Fields to project. Empty means every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectSpec {
    fields: Vec<String>,
}

impl SelectSpec {
    /// Adds a field, ignoring duplicates while keeping first-seen order.
    pub fn insert(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Comparison operators accepted in `field[op]=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Predicate tree evaluated by a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Cmp { path: String, op: CmpOp, value: Bson },
    In { path: String, values: Vec<Bson> },
    GeoWithin { path: String, center: GeoPoint, radius_rad: f64 },
}

/// One `(operator, value)` constraint on a field. For `In` the value is a `Bson::Array`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: Operator,
    pub value: Bson,
}

/// Field constraints built from a request. Conditions on the same field are ANDed,
/// and so are the geo predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    fields: BTreeMap<String, Vec<Condition>>,
    geo: Vec<Filter>,
}

impl FilterSpec {
    /// # Errors
    /// Returns a validation error if the field already carries the same operator.
    pub fn add(&mut self, path: &str, op: Operator, value: Bson) -> Result<(), ScoutError> {
        let conds = self.fields.entry(path.to_string()).or_default();
        if conds.iter().any(|c| c.op == op) {
            return Err(ScoutError::Validation(format!(
                "duplicate operator '{}' for field '{path}'",
                op.token()
            )));
        }
        conds.push(Condition { op, value });
        Ok(())
    }

    /// ANDs a geo containment predicate (see `RadiusQuery::to_filter`).
    pub fn push_geo(&mut self, predicate: Filter) {
        self.geo.push(predicate);
    }

    #[must_use]
    pub fn conditions(&self, path: &str) -> Option<&[Condition]> {
        self.fields.get(path).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[Condition])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.geo.is_empty()
    }

    /// Lowers the spec into the predicate tree a collection evaluates.
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        let mut parts = Vec::new();
        for (path, conds) in &self.fields {
            for c in conds {
                let f = match (c.op, &c.value) {
                    (Operator::In, Bson::Array(values)) => {
                        Filter::In { path: path.clone(), values: values.iter().take(MAX_IN_SET).cloned().collect() }
                    }
                    (Operator::In, v) => Filter::In { path: path.clone(), values: vec![v.clone()] },
                    (Operator::Eq, v) => Filter::Cmp { path: path.clone(), op: CmpOp::Eq, value: v.clone() },
                    (Operator::Gt, v) => Filter::Cmp { path: path.clone(), op: CmpOp::Gt, value: v.clone() },
                    (Operator::Gte, v) => Filter::Cmp { path: path.clone(), op: CmpOp::Gte, value: v.clone() },
                    (Operator::Lt, v) => Filter::Cmp { path: path.clone(), op: CmpOp::Lt, value: v.clone() },
                    (Operator::Lte, v) => Filter::Cmp { path: path.clone(), op: CmpOp::Lte, value: v.clone() },
                };
                parts.push(f);
            }
        }
        parts.extend(self.geo.iter().cloned());
        match parts.len() {
            0 => Filter::True,
            1 => parts.pop().unwrap_or(Filter::True),
            _ => Filter::And(parts),
        }
    }
}

/// Options for `Collection::find`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub projection: Option<Vec<String>>,
    pub sort: Vec<SortKey>,
    pub skip: usize,
    pub limit: Option<usize>,
}

/// A single query-string value, or every value of a repeated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(s) => vec![s.as_str()],
            Self::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Raw request parameters as handed over by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuery {
    params: BTreeMap<String, QueryValue>,
}

impl RawQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a=1&b%5Bgte%5D=2`. Keys and values are percent-decoded and `+` reads as a space.
    /// A repeated key collects all its values.
    ///
    /// # Errors
    /// Returns a validation error for an empty key or invalid percent-encoding.
    pub fn from_query_string(qs: &str) -> Result<Self, ScoutError> {
        let mut out = Self::new();
        for pair in qs.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(k)?;
            if key.is_empty() {
                return Err(ScoutError::validation("empty query parameter name"));
            }
            out.append(key, decode_component(v)?);
        }
        Ok(out)
    }

    /// Builder-style insert; replaces any previous value of `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), QueryValue::One(value.into()));
    }

    /// Adds a value, turning the key into a list when it already exists.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.params.entry(key.into()) {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(QueryValue::One(value));
            }
            std::collections::btree_map::Entry::Occupied(mut e) => {
                let prev = std::mem::replace(e.get_mut(), QueryValue::Many(Vec::new()));
                let mut all = match prev {
                    QueryValue::One(first) => vec![first],
                    QueryValue::Many(all) => all,
                };
                all.push(value);
                *e.get_mut() = QueryValue::Many(all);
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.params.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn decode_component(raw: &str) -> Result<String, ScoutError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ScoutError::Validation(format!("malformed query string component '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_decodes_and_collects_repeats() {
        let q = RawQuery::from_query_string("?name=FC+Rex&age%5Bgte%5D=18&pos=GK&pos=CB").unwrap();
        assert_eq!(q.get("name"), Some(&QueryValue::One("FC Rex".into())));
        assert_eq!(q.get("age[gte]"), Some(&QueryValue::One("18".into())));
        assert_eq!(q.get("pos"), Some(&QueryValue::Many(vec!["GK".into(), "CB".into()])));
    }

    #[test]
    fn query_string_rejects_empty_key() {
        assert!(RawQuery::from_query_string("=1").is_err());
    }

    #[test]
    fn filter_spec_lowers_to_and() {
        let mut spec = FilterSpec::default();
        assert_eq!(spec.to_filter(), Filter::True);
        spec.add("age", Operator::Gte, Bson::Int64(18)).unwrap();
        assert!(matches!(spec.to_filter(), Filter::Cmp { op: CmpOp::Gte, .. }));
        spec.add("age", Operator::Lt, Bson::Int64(30)).unwrap();
        assert!(matches!(spec.to_filter(), Filter::And(ref v) if v.len() == 2));
        assert!(spec.add("age", Operator::Lt, Bson::Int64(40)).is_err());
    }

    #[test]
    fn select_spec_dedupes_in_order() {
        let mut s = SelectSpec::default();
        s.insert("b");
        s.insert("a");
        s.insert("b");
        assert_eq!(s.fields(), ["b".to_string(), "a".to_string()]);
    }
}
