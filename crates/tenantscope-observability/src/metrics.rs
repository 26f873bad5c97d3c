//! Metrics collection with Prometheus

use std::sync::Arc;

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use tenantscope_core::{EventSink, TenantEvent};

/// Prometheus collectors for resolution events.
///
/// Every event counts one occurrence; resolutions additionally observe
/// the duration of the whole pipeline pass.
#[derive(Clone)]
pub struct ResolutionMetrics {
    /// Registry all collectors are registered on
    registry: Arc<Registry>,

    /// Successful resolutions, labeled by the winning source
    pub resolutions_total: CounterVec,
    /// Duration of successful pipeline passes
    pub resolution_duration_seconds: Histogram,
    /// Failed passes, labeled by kind (`failed` = structured source
    /// failure, `panicked` = recovered source panic)
    pub resolution_failures_total: CounterVec,
    /// Explicit tenant clears
    pub cleared_total: Counter,
    /// Context snapshot operations, labeled by op (`created`/`applied`)
    pub snapshots_total: CounterVec,
}

impl ResolutionMetrics {
    /// Create the collectors on a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let resolutions_total = CounterVec::new(
            Opts::new(
                "tenantscope_resolutions_total",
                "Total number of successful tenant resolutions",
            ),
            &["source"],
        )?;

        let resolution_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "tenantscope_resolution_duration_seconds",
                "Duration of successful resolution passes",
            )
            .buckets(vec![
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05,
            ]),
        )?;

        let resolution_failures_total = CounterVec::new(
            Opts::new(
                "tenantscope_resolution_failures_total",
                "Total number of failed resolution passes",
            ),
            &["kind"],
        )?;

        let cleared_total = Counter::with_opts(Opts::new(
            "tenantscope_cleared_total",
            "Total number of explicit tenant clears",
        ))?;

        let snapshots_total = CounterVec::new(
            Opts::new(
                "tenantscope_snapshots_total",
                "Total number of context snapshot operations",
            ),
            &["op"],
        )?;

        registry.register(Box::new(resolutions_total.clone()))?;
        registry.register(Box::new(resolution_duration_seconds.clone()))?;
        registry.register(Box::new(resolution_failures_total.clone()))?;
        registry.register(Box::new(cleared_total.clone()))?;
        registry.register(Box::new(snapshots_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            resolutions_total,
            resolution_duration_seconds,
            resolution_failures_total,
            cleared_total,
            snapshots_total,
        })
    }

    /// The registry backing these collectors, for scraping endpoints.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl EventSink for ResolutionMetrics {
    fn emit(&self, event: &TenantEvent) {
        match event {
            TenantEvent::Resolved {
                source, duration, ..
            } => {
                self.resolutions_total
                    .with_label_values(&[source.as_str()])
                    .inc();
                self.resolution_duration_seconds
                    .observe(duration.as_secs_f64());
            }
            TenantEvent::Cleared { .. } => self.cleared_total.inc(),
            TenantEvent::SourceFailed { .. } => {
                self.resolution_failures_total
                    .with_label_values(&["failed"])
                    .inc();
            }
            TenantEvent::SourcePanicked { .. } => {
                self.resolution_failures_total
                    .with_label_values(&["panicked"])
                    .inc();
            }
            TenantEvent::SnapshotCreated => {
                self.snapshots_total.with_label_values(&["created"]).inc();
            }
            TenantEvent::SnapshotApplied => {
                self.snapshots_total.with_label_values(&["applied"]).inc();
            }
        }
    }
}
