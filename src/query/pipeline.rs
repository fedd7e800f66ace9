//! The advanced-results pipeline: translate, (geo) augment, count + fetch, populate,
//! paginate, assemble.

use crate::config::{PaginationConfig, ScoutConfig};
use crate::errors::ScoutError;
use crate::store::Collection;
use std::time::Instant;

use super::envelope::ResultEnvelope;
use super::geo::{GeoPoint, RadiusQuery};
use super::paginate::{page_window, paginate};
use super::parse::{QueryTranslator, TranslatedQuery};
use super::populate::{PopulateSpec, ReferenceLookup, populate};
use super::schema::EntitySchema;
use super::telemetry::{ResolutionStats, log_resolution};
use super::types::{FindOptions, RawQuery};

/// Resolves request queries against collections of one entity type.
#[derive(Debug)]
pub struct QueryResolver<'a, L> {
    schema: &'static EntitySchema,
    lookup: &'a L,
    pagination: PaginationConfig,
    slow_query_ms: u64,
}

impl<'a, L: ReferenceLookup> QueryResolver<'a, L> {
    #[must_use]
    pub fn new(schema: &'static EntitySchema, lookup: &'a L) -> Self {
        let cfg = ScoutConfig::default();
        Self { schema, lookup, pagination: cfg.pagination, slow_query_ms: cfg.telemetry.slow_query_ms }
    }

    #[must_use]
    pub fn with_config(mut self, cfg: &ScoutConfig) -> Self {
        self.pagination = cfg.pagination;
        self.slow_query_ms = cfg.telemetry.slow_query_ms;
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// The standard path.
    ///
    /// # Errors
    /// `Validation` for malformed parameters or populate paths; store and lookup failures unchanged.
    pub async fn resolve<C: Collection>(
        &self,
        collection: &C,
        raw: &RawQuery,
        populate_spec: Option<&PopulateSpec>,
    ) -> Result<ResultEnvelope, ScoutError> {
        let query = QueryTranslator::new(self.schema, self.pagination).translate(raw)?;
        self.run(collection, query, populate_spec, false).await
    }

    /// The geospatial path: `raw` filters are ANDed with containment in the radius around `center`.
    ///
    /// # Errors
    /// `Validation` for a bad radius, a schema without a location field, or malformed parameters.
    pub async fn resolve_within_radius<C: Collection>(
        &self,
        collection: &C,
        center: GeoPoint,
        radius_km: f64,
        raw: Option<&RawQuery>,
    ) -> Result<ResultEnvelope, ScoutError> {
        let radius = RadiusQuery::new(center, radius_km)?;
        let path = self
            .schema
            .geo_field()
            .ok_or_else(|| ScoutError::Validation(format!("{} has no location field", self.schema.name)))?;
        let empty = RawQuery::new();
        let mut query = QueryTranslator::new(self.schema, self.pagination).translate(raw.unwrap_or(&empty))?;
        query.filter.push_geo(radius.to_filter(path));
        self.run(collection, query, None, true).await
    }

    async fn run<C: Collection>(
        &self,
        collection: &C,
        query: TranslatedQuery,
        populate_spec: Option<&PopulateSpec>,
        geo: bool,
    ) -> Result<ResultEnvelope, ScoutError> {
        let started = Instant::now();
        // Reject bad populate paths before touching the store.
        if let Some(spec) = populate_spec {
            spec.targets(self.schema)?;
        }
        let filter = query.filter.to_filter();
        log::debug!("resolving {} with {filter:?}", collection.name());

        let total = collection.count(&filter).await?;
        let window = page_window(&query.page);
        let opts = FindOptions {
            projection: (!query.select.is_empty()).then(|| query.select.fields().to_vec()),
            sort: query.sort.keys,
            skip: window.skip,
            limit: Some(window.limit),
        };
        let mut data = collection.find(&filter, &opts).await?;
        if let Some(spec) = populate_spec.filter(|s| !s.is_empty()) {
            data = populate(data, spec, self.schema, self.lookup).await?;
        }

        let envelope = ResultEnvelope::new(data, total, paginate(total, &query.page));
        log_resolution(
            &ResolutionStats {
                collection: collection.name(),
                duration: started.elapsed(),
                count: envelope.count,
                total,
                page: query.page.page(),
                limit: query.page.limit(),
                geo,
            },
            self.slow_query_ms,
        );
        Ok(envelope)
    }
}
