//! Prometheus metrics for tenant resolution
//!
//! [`ResolutionMetrics`] implements the core `EventSink`, so installing it
//! process-wide routes every resolution event into a Prometheus registry:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tenantscope_core::events;
//! use tenantscope_observability::ResolutionMetrics;
//!
//! let metrics = Arc::new(ResolutionMetrics::new()?);
//! events::install(metrics.clone());
//! // expose metrics.registry() on the host's /metrics endpoint
//! ```

pub mod metrics;

pub use metrics::ResolutionMetrics;
