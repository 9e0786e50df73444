//! Cache metrics for observability

use crate::Scope;
use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<CacheMetricsInner> = OnceLock::new();

struct CacheMetricsInner {
    hits: CounterVec,
    misses: CounterVec,
    stale: CounterVec,
    writes: CounterVec,
    skipped_writes: CounterVec,
    bumps: CounterVec,
    errors: CounterVec,
}

fn counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("valid metric definition")
}

impl CacheMetricsInner {
    fn new() -> Self {
        Self {
            hits: counter("versioned_cache_hits_total", "Total cache hits", &["scope"]),
            misses: counter(
                "versioned_cache_misses_total",
                "Total cache misses",
                &["scope"],
            ),
            stale: counter(
                "versioned_cache_stale_total",
                "Envelopes rejected because the change counter moved past them",
                &["scope"],
            ),
            writes: counter(
                "versioned_cache_writes_total",
                "Total envelope writes",
                &["scope"],
            ),
            skipped_writes: counter(
                "versioned_cache_skipped_writes_total",
                "Repopulations skipped after a concurrent bump",
                &["scope"],
            ),
            bumps: counter(
                "versioned_cache_bumps_total",
                "Total change counter increments",
                &["scope"],
            ),
            errors: counter(
                "versioned_cache_errors_total",
                "Total cache errors",
                &["scope", "error_type"],
            ),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.hits.clone()))?;
        registry.register(Box::new(self.misses.clone()))?;
        registry.register(Box::new(self.stale.clone()))?;
        registry.register(Box::new(self.writes.clone()))?;
        registry.register(Box::new(self.skipped_writes.clone()))?;
        registry.register(Box::new(self.bumps.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static CacheMetricsInner {
    METRICS.get_or_init(CacheMetricsInner::new)
}

/// Cache metrics wrapper
#[derive(Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_hit(&self, scope: &Scope) {
        get_metrics().hits.with_label_values(&[scope.kind()]).inc();
    }

    pub fn record_miss(&self, scope: &Scope) {
        get_metrics().misses.with_label_values(&[scope.kind()]).inc();
    }

    pub fn record_stale(&self, scope: &Scope) {
        get_metrics().stale.with_label_values(&[scope.kind()]).inc();
    }

    pub fn record_write(&self, scope: &Scope) {
        get_metrics().writes.with_label_values(&[scope.kind()]).inc();
    }

    pub fn record_skipped_write(&self, scope: &Scope) {
        get_metrics()
            .skipped_writes
            .with_label_values(&[scope.kind()])
            .inc();
    }

    pub fn record_bump(&self, scope: &Scope) {
        get_metrics().bumps.with_label_values(&[scope.kind()]).inc();
    }

    pub fn record_error(&self, scope: &Scope, error_type: &str) {
        get_metrics()
            .errors
            .with_label_values(&[scope.kind(), error_type])
            .inc();
    }

    #[cfg(test)]
    pub(crate) fn skipped_writes(scope: &Scope) -> f64 {
        get_metrics()
            .skipped_writes
            .with_label_values(&[scope.kind()])
            .get()
    }
}
