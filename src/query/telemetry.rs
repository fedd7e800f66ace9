use std::time::Duration;

/// Log target for per-resolution metrics lines; routed to `metrics.log` by `logger`.
pub const METRICS_TARGET: &str = "scoutlite::metrics";

#[derive(Debug, Clone, Copy)]
pub struct ResolutionStats<'a> {
    pub collection: &'a str,
    pub duration: Duration,
    pub count: usize,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub geo: bool,
}

impl ResolutionStats<'_> {
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::json!({
            "ts": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "op": if self.geo { "resolve_within_radius" } else { "resolve" },
            "collection": self.collection,
            "duration_ms": u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            "count": self.count,
            "total": self.total,
            "page": self.page,
            "limit": self.limit,
        })
        .to_string()
    }
}

/// Emits the metrics line, and a warning when the resolution exceeded `slow_query_ms`.
pub fn log_resolution(stats: &ResolutionStats<'_>, slow_query_ms: u64) {
    log::info!(target: METRICS_TARGET, "{}", stats.to_json_line());
    if stats.duration > Duration::from_millis(slow_query_ms) {
        log::warn!(
            "slow query on {}: {} ms (threshold {slow_query_ms} ms)",
            stats.collection,
            stats.duration.as_millis()
        );
    }
}
