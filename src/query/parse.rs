use crate::config::PaginationConfig;
use crate::errors::ScoutError;
use crate::types::DocumentId;
use bson::Bson;
use chrono::{DateTime, NaiveDate, Utc};

use super::paginate::PageSpec;
use super::schema::{EntitySchema, FieldDef, FieldType};
use super::types::{
    FilterSpec, MAX_IN_SET, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS, Operator, Order, QueryValue, RESERVED_KEYS,
    RawQuery, SelectSpec, SortKey, SortSpec,
};

/// Everything a request's query string asks for, validated against an entity schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub select: SelectSpec,
    pub page: PageSpec,
}

/// Turns raw query parameters into filter, sort, select and page specs.
#[derive(Debug, Clone, Copy)]
pub struct QueryTranslator<'a> {
    schema: &'a EntitySchema,
    pagination: PaginationConfig,
}

impl<'a> QueryTranslator<'a> {
    #[must_use]
    pub const fn new(schema: &'a EntitySchema, pagination: PaginationConfig) -> Self {
        Self { schema, pagination }
    }

    /// # Errors
    /// Returns a validation error naming the offending parameter, operator token or value.
    pub fn translate(&self, raw: &RawQuery) -> Result<TranslatedQuery, ScoutError> {
        let select = match reserved_value(raw, "select")? {
            Some(v) => parse_select(v, self.schema)?,
            None => SelectSpec::default(),
        };
        let sort = match reserved_value(raw, "sort")? {
            Some(v) => parse_sort(v, self.schema)?,
            None if self.schema.default_sort.is_empty() => SortSpec::default(),
            None => parse_sort(self.schema.default_sort, self.schema)?,
        };
        let page_no = match reserved_value(raw, "page")? {
            Some(v) => parse_positive("page", v)?,
            None => 1,
        };
        let mut limit = match reserved_value(raw, "limit")? {
            Some(v) => parse_positive("limit", v)?,
            None => self.pagination.default_limit,
        };
        if limit > self.pagination.max_limit {
            log::warn!("limit {limit} clamped to {}", self.pagination.max_limit);
            limit = self.pagination.max_limit;
        }
        let page = PageSpec::new(page_no, limit)?;

        let mut filter = FilterSpec::default();
        for (key, value) in raw.iter() {
            if RESERVED_KEYS.contains(&key) {
                continue;
            }
            let (path, op) = split_key(key)?;
            let def = self
                .schema
                .field(path)
                .filter(|f| f.filterable)
                .ok_or_else(|| ScoutError::Validation(format!("field '{path}' is not filterable on {}", self.schema.name)))?;
            let bson = coerce_condition(def, op, value)?;
            filter.add(path, op, bson)?;
        }
        Ok(TranslatedQuery { filter, sort, select, page })
    }
}

fn reserved_value<'q>(raw: &'q RawQuery, key: &str) -> Result<Option<&'q str>, ScoutError> {
    match raw.get(key) {
        None => Ok(None),
        Some(QueryValue::One(v)) => Ok(Some(v.as_str())),
        Some(QueryValue::Many(_)) => Err(ScoutError::Validation(format!("parameter '{key}' given more than once"))),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize, ScoutError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ScoutError::Validation(format!("'{key}' must be a positive integer, got '{raw}'"))),
    }
}

/// Splits `field[op]` into its parts; a bare `field` means equality.
fn split_key(key: &str) -> Result<(&str, Operator), ScoutError> {
    let Some(open) = key.find('[') else {
        if key.contains(']') {
            return Err(ScoutError::Validation(format!("malformed parameter '{key}'")));
        }
        return Ok((key, Operator::Eq));
    };
    let field = &key[..open];
    let token = key[open + 1..]
        .strip_suffix(']')
        .filter(|t| !t.contains('[') && !t.contains(']'))
        .ok_or_else(|| ScoutError::Validation(format!("malformed parameter '{key}'")))?;
    if field.is_empty() {
        return Err(ScoutError::Validation(format!("malformed parameter '{key}'")));
    }
    let op = Operator::from_token(token)
        .ok_or_else(|| ScoutError::Validation(format!("unknown operator '{token}' in '{key}'")))?;
    Ok((field, op))
}

fn coerce_condition(def: &FieldDef, op: Operator, value: &QueryValue) -> Result<Bson, ScoutError> {
    let raws = value.values();
    if op == Operator::In {
        let mut items = Vec::new();
        for part in raws.iter().flat_map(|r| r.split(',')) {
            if part.is_empty() {
                return Err(ScoutError::Validation(format!("empty value in '{}[in]'", def.path)));
            }
            items.push(coerce_value(def, part)?);
        }
        if items.len() > MAX_IN_SET {
            return Err(ScoutError::Validation(format!("'{}[in]' exceeds {MAX_IN_SET} values", def.path)));
        }
        return Ok(Bson::Array(items));
    }
    match raws.as_slice() {
        [single] => coerce_value(def, single),
        _ => Err(ScoutError::Validation(format!(
            "parameter '{}[{}]' given more than once",
            def.path,
            op.token()
        ))),
    }
}

/// Coerces a raw string to the field's declared type.
///
/// # Errors
/// Returns a validation error citing the field and the raw value.
pub fn coerce_value(def: &FieldDef, raw: &str) -> Result<Bson, ScoutError> {
    let fail = || ScoutError::Validation(format!("cannot read '{raw}' as {:?} for field '{}'", def.kind, def.path));
    match def.kind {
        FieldType::String => Ok(Bson::String(raw.to_string())),
        FieldType::Number => {
            let t = raw.trim();
            if let Ok(i) = t.parse::<i64>() {
                return Ok(Bson::Int64(i));
            }
            t.parse::<f64>().ok().filter(|f| f.is_finite()).map(Bson::Double).ok_or_else(fail)
        }
        FieldType::Boolean => match raw.trim() {
            "true" | "1" => Ok(Bson::Boolean(true)),
            "false" | "0" => Ok(Bson::Boolean(false)),
            _ => Err(fail()),
        },
        FieldType::Date => parse_date(raw.trim()).map(Bson::DateTime).ok_or_else(fail),
        FieldType::Id | FieldType::Reference(_) => {
            raw.parse::<DocumentId>().map(|id| Bson::String(id.to_string())).map_err(|_| fail())
        }
        FieldType::GeoPoint => Err(fail()),
    }
}

fn parse_date(raw: &str) -> Option<bson::DateTime> {
    let millis = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc).timestamp_millis()
    } else {
        let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis()
    };
    Some(bson::DateTime::from_millis(millis))
}

fn tokens<'r>(kind: &str, raw: &'r str) -> Result<Vec<&'r str>, ScoutError> {
    raw.split(',')
        .map(str::trim)
        .map(|t| {
            if t.is_empty() {
                Err(ScoutError::Validation(format!("empty {kind} token in '{raw}'")))
            } else {
                Ok(t)
            }
        })
        .collect()
}

/// Parses `a,-b` into ascending `a` then descending `b`.
///
/// # Errors
/// Returns a validation error for empty tokens, unknown or unsortable fields, or too many keys.
pub fn parse_sort(raw: &str, schema: &EntitySchema) -> Result<SortSpec, ScoutError> {
    let mut spec = SortSpec::default();
    for tok in tokens("sort", raw)? {
        let (order, field) = if let Some(rest) = tok.strip_prefix('-') {
            (Order::Desc, rest)
        } else if let Some(rest) = tok.strip_prefix('+') {
            (Order::Asc, rest)
        } else {
            (Order::Asc, tok)
        };
        if !schema.field(field).is_some_and(|f| f.sortable) {
            return Err(ScoutError::Validation(format!("field '{field}' is not sortable on {}", schema.name)));
        }
        if spec.keys.iter().any(|k| k.field == field) {
            continue;
        }
        spec.keys.push(SortKey { field: field.to_string(), order });
    }
    if spec.keys.len() > MAX_SORT_FIELDS {
        return Err(ScoutError::Validation(format!("at most {MAX_SORT_FIELDS} sort fields allowed")));
    }
    Ok(spec)
}

/// Parses `a,b,c` into a projection.
///
/// # Errors
/// Returns a validation error for empty tokens, unknown fields, or too many fields.
pub fn parse_select(raw: &str, schema: &EntitySchema) -> Result<SelectSpec, ScoutError> {
    let mut spec = SelectSpec::default();
    for tok in tokens("select", raw)? {
        if !schema.knows_path(tok) {
            return Err(ScoutError::Validation(format!("unknown field '{tok}' in select")));
        }
        spec.insert(tok);
    }
    if spec.fields().len() > MAX_PROJECTION_FIELDS {
        return Err(ScoutError::Validation(format!("at most {MAX_PROJECTION_FIELDS} selected fields allowed")));
    }
    Ok(spec)
}
