//! Observability events for tenant resolution
//!
//! The pipeline and context store report what happened through a single
//! [`EventSink`] interface. The default sink logs structured `tracing`
//! events; hosts that want metrics install their own sink process-wide
//! (e.g. the Prometheus sink from `tenantscope-observability`), mirroring
//! the global-dispatch model of `tracing` itself.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::value::TenantValue;

/// One observability event. Every emission counts one occurrence;
/// `Resolved` additionally carries a duration measurement for the whole
/// pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantEvent {
    /// A source produced a tenant and the pipeline stopped.
    Resolved {
        tenant: TenantValue,
        source: String,
        duration: Duration,
    },
    /// The configured context key was explicitly cleared.
    Cleared { tenant: TenantValue },
    /// A source returned a structured failure and the pipeline stopped.
    SourceFailed { reason: String },
    /// A source panicked; the pipeline recovered and moved on.
    SourcePanicked { source: String, message: String },
    /// A context snapshot was captured.
    SnapshotCreated,
    /// A context snapshot was written into an execution context.
    SnapshotApplied,
}

impl TenantEvent {
    /// Stable dotted event name, shared by all sinks.
    pub fn name(&self) -> &'static str {
        match self {
            TenantEvent::Resolved { .. } => "tenant.resolved",
            TenantEvent::Cleared { .. } => "tenant.cleared",
            TenantEvent::SourceFailed { .. } => "error.source_failed",
            TenantEvent::SourcePanicked { .. } => "error.source_panicked",
            TenantEvent::SnapshotCreated => "context.snapshot_created",
            TenantEvent::SnapshotApplied => "context.snapshot_applied",
        }
    }
}

/// Receiver for resolution events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &TenantEvent);
}

/// Default sink: structured `tracing` events, warn level for failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &TenantEvent) {
        match event {
            TenantEvent::Resolved {
                tenant,
                source,
                duration,
            } => {
                tracing::debug!(
                    event = event.name(),
                    tenant = %tenant,
                    source = %source,
                    duration_us = duration.as_micros() as u64,
                    "tenant resolved"
                );
            }
            TenantEvent::Cleared { tenant } => {
                tracing::debug!(event = event.name(), tenant = %tenant, "tenant cleared");
            }
            TenantEvent::SourceFailed { reason } => {
                tracing::warn!(event = event.name(), reason = %reason, "tenant source failed");
            }
            TenantEvent::SourcePanicked { source, message } => {
                tracing::error!(
                    event = event.name(),
                    source = %source,
                    message = %message,
                    "tenant source panicked"
                );
            }
            TenantEvent::SnapshotCreated | TenantEvent::SnapshotApplied => {
                tracing::trace!(event = event.name(), "context snapshot");
            }
        }
    }
}

/// Sink that records events in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TenantEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<TenantEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }

    /// Names of everything emitted so far, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(TenantEvent::name).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &TenantEvent) {
        self.events
            .lock()
            .expect("event sink poisoned")
            .push(event.clone());
    }
}

static SINK: OnceCell<Arc<dyn EventSink>> = OnceCell::new();

/// Install a process-wide sink. The first installation wins; returns
/// whether this call installed the sink.
pub fn install(sink: Arc<dyn EventSink>) -> bool {
    SINK.set(sink).is_ok()
}

/// Emit through the installed sink, or the tracing default.
pub fn emit(event: &TenantEvent) {
    match SINK.get() {
        Some(sink) => sink.emit(event),
        None => TracingSink.emit(event),
    }
}
