pub mod telemetry;

pub mod eval;
mod envelope;
mod geo;
mod paginate;
mod parse;
mod pipeline;
mod populate;
mod schema;
mod types;

pub use envelope::ResultEnvelope;
pub use geo::{EARTH_RADIUS_KM, GeoPoint, RadiusQuery};
pub use paginate::{PageRef, PageSpec, PageWindow, Pagination, page_window, paginate};
pub use parse::{QueryTranslator, TranslatedQuery, coerce_value, parse_select, parse_sort};
pub use pipeline::QueryResolver;
pub use populate::{PopulateField, PopulateSpec, ReferenceLookup, populate};
pub use schema::{EntitySchema, FieldDef, FieldType};
pub use types::{
    CmpOp, Condition, Filter, FilterSpec, FindOptions, Operator, Order, QueryValue, RESERVED_KEYS, RawQuery,
    SelectSpec, SortKey, SortSpec,
};
