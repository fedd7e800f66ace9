use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::geo::{GeoPoint, within};
use super::types::{CmpOp, Filter, MAX_IN_SET, MAX_PATH_DEPTH, MAX_SORT_FIELDS, Order, SortKey};

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::In { path, values } => get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Cmp { path, op, value } => get_path(doc, path).is_some_and(|v| {
            let c = compare_bson(v, value);
            // Values of different kinds never satisfy a range.
            let comparable = same_kind(v, value);
            match op {
                CmpOp::Eq => comparable && c == Ordering::Equal,
                CmpOp::Gt => comparable && c == Ordering::Greater,
                CmpOp::Gte => comparable && c != Ordering::Less,
                CmpOp::Lt => comparable && c == Ordering::Less,
                CmpOp::Lte => comparable && c != Ordering::Greater,
            }
        }),
        Filter::GeoWithin { path, center, radius_rad } => get_path(doc, path)
            .and_then(GeoPoint::from_geojson)
            .is_some_and(|p| within(center, *radius_rad, &p)),
    }
}

/// Orders two documents by the sort keys; `Equal` when every key ties.
pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortKey]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().take(MAX_IN_SET).any(|x| same_kind(v, x) && compare_bson(v, x) == Ordering::Equal)
}

/// Resolves a dotted path through nested documents.
pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut parts = path.split('.');
    let mut cur = doc.get(parts.next()?)?;
    for (depth, part) in parts.enumerate() {
        if depth + 1 >= MAX_PATH_DEPTH {
            return None;
        }
        match cur {
            Bson::Document(d) => cur = d.get(part)?,
            _ => return None,
        }
    }
    Some(cur)
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

fn same_kind(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || type_rank(a) == type_rank(b)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        _ => f64::NAN,
    }
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    match (a, b) {
        (T::Int32(x), T::Int32(y)) => x.cmp(y),
        (T::Int64(x), T::Int64(y)) => x.cmp(y),
        (T::Int32(x), T::Int64(y)) => i64::from(*x).cmp(y),
        (T::Int64(x), T::Int32(y)) => x.cmp(&i64::from(*y)),
        _ if is_num(a) && is_num(b) => as_f64_num(a).total_cmp(&as_f64_num(b)),
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        (T::DateTime(x), T::DateTime(y)) => x.cmp(y),
        (T::Null, T::Null) => Ordering::Equal,
        (T::Array(x), T::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let c = compare_bson(l, r);
                if c != Ordering::Equal {
                    return c;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::Null | T::Undefined => 0,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 1,
        T::String(_) | T::Symbol(_) => 2,
        T::Document(_) => 3,
        T::Array(_) => 4,
        T::Binary(_) => 5,
        T::ObjectId(_) => 6,
        T::Boolean(_) => 7,
        T::DateTime(_) => 8,
        T::Timestamp(_) => 9,
        T::RegularExpression(_) => 10,
        _ => 11,
    }
}

/// Keeps `_id` plus the listed paths. A dotted path keeps only that leaf inside its parents.
pub fn project_fields(doc: &BsonDocument, fields: &[String]) -> BsonDocument {
    let mut out = BsonDocument::new();
    if let Some(id) = doc.get(crate::document::ID_FIELD) {
        out.insert(crate::document::ID_FIELD, id.clone());
    }
    for f in fields {
        if let Some(v) = get_path(doc, f) {
            insert_path(&mut out, f, v.clone());
        }
    }
    out
}

fn insert_path(root: &mut BsonDocument, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            root.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(root.get(head), Some(Bson::Document(_))) {
                root.insert(head, BsonDocument::new());
            }
            if let Some(Bson::Document(child)) = root.get_mut(head) {
                insert_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn numeric_kinds_compare_by_value() {
        assert_eq!(compare_bson(&Bson::Int32(18), &Bson::Int64(18)), Ordering::Equal);
        assert_eq!(compare_bson(&Bson::Double(17.5), &Bson::Int64(18)), Ordering::Less);
        assert_eq!(compare_bson(&Bson::Int64(i64::MAX), &Bson::Int64(i64::MAX - 1)), Ordering::Greater);
    }

    #[test]
    fn range_excludes_mismatched_kinds() {
        let d = doc! {"age": "18"};
        let f = Filter::Cmp { path: "age".into(), op: CmpOp::Gte, value: Bson::Int64(1) };
        assert!(!eval_filter(&d, &f));
    }

    #[test]
    fn gte_includes_boundary() {
        let f = Filter::Cmp { path: "age".into(), op: CmpOp::Gte, value: Bson::Int64(18) };
        assert!(eval_filter(&doc! {"age": 18}, &f));
        assert!(!eval_filter(&doc! {"age": 17}, &f));
        assert!(!eval_filter(&doc! {"name": "x"}, &f));
    }

    #[test]
    fn nested_paths() {
        let d = doc! {"location": {"voivodeshipSlug": "wielkopolskie", "city": "Poznan"}};
        assert_eq!(get_path(&d, "location.city"), Some(&Bson::String("Poznan".into())));
        assert_eq!(get_path(&d, "location.zip"), None);
        assert_eq!(get_path(&d, "location.city.x"), None);
        let p = project_fields(&d, &["location.city".to_string()]);
        assert_eq!(p, doc! {"location": {"city": "Poznan"}});
    }

    #[test]
    fn in_set_matches_numerically() {
        let f = Filter::In { path: "n".into(), values: vec![Bson::Int64(1), Bson::Int64(3)] };
        assert!(eval_filter(&doc! {"n": 3}, &f));
        assert!(!eval_filter(&doc! {"n": 2}, &f));
    }

    #[test]
    fn sort_missing_first_then_desc() {
        let a = doc! {"x": 1};
        let b = doc! {"y": 1};
        let asc = [SortKey { field: "x".into(), order: Order::Asc }];
        assert_eq!(compare_docs(&a, &b, &asc), Ordering::Greater);
        let desc = [SortKey { field: "x".into(), order: Order::Desc }];
        assert_eq!(compare_docs(&a, &b, &desc), Ordering::Less);
    }
}
