//! Resolution pipeline
//!
//! Drives the configured sources in order, one pass per request:
//! - first source to produce a non-null tenant wins; the rest never run
//! - `NotFound` (and a null `Found`) moves on to the next source
//! - `Failed` stops the pass immediately and carries its reason out
//! - a panicking source is recovered, reported, and treated as a miss
//!
//! The pipeline itself never returns an error and never panics because of
//! a misbehaving source; the only user-visible failure mode is the 400
//! halt the middleware derives from `require_resolved`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tenantscope_core::events::{self, EventSink, TenantEvent};
use tenantscope_core::metadata::{LogContext, SpanLogContext};
use tenantscope_core::{RequestView, TenantContext, TenantValue};

use crate::config::{PipelineConfig, SourceConfig};
use crate::error::ConfigError;
use crate::header::HeaderSource;
use crate::source::{Outcome, TenantSource};

/// Result of one pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A source produced a tenant; it has been written to the context.
    Resolved { tenant: TenantValue, source: String },
    /// No source produced a tenant. `reason` is set when a source failed
    /// (as opposed to the plain nothing-matched case).
    Unresolved { reason: Option<String> },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    /// The resolved tenant, if any.
    pub fn tenant(&self) -> Option<&TenantValue> {
        match self {
            Resolution::Resolved { tenant, .. } => Some(tenant),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Ordered source chain plus pipeline flags. Immutable once built; share
/// one instance (behind `Arc`) across all in-flight requests.
pub struct TenantPipeline {
    sources: Vec<Arc<dyn TenantSource>>,
    config: PipelineConfig,
    log_context: Arc<dyn LogContext>,
    sink: Option<Arc<dyn EventSink>>,
}

impl TenantPipeline {
    pub fn builder() -> TenantPipelineBuilder {
        TenantPipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one resolution pass and record the outcome in `ctx`.
    pub fn resolve(&self, request: &dyn RequestView, ctx: &mut TenantContext) -> Resolution {
        let started = Instant::now();

        for source in &self.sources {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| source.extract(request)));
            let outcome = match attempt {
                Ok(outcome) => outcome,
                Err(payload) => {
                    self.emit(&TenantEvent::SourcePanicked {
                        source: source.name().to_string(),
                        message: panic_message(payload.as_ref()),
                    });
                    continue;
                }
            };

            match outcome {
                Outcome::Found(tenant) if !tenant.is_null() => {
                    ctx.set(self.config.context_key.as_str(), tenant.clone());
                    if self.config.logger_metadata_enabled {
                        self.log_context.set(&self.config.context_key, &tenant);
                    }
                    self.emit(&TenantEvent::Resolved {
                        tenant: tenant.clone(),
                        source: source.name().to_string(),
                        duration: started.elapsed(),
                    });
                    return Resolution::Resolved {
                        tenant,
                        source: source.name().to_string(),
                    };
                }
                Outcome::Found(_) | Outcome::NotFound => {}
                Outcome::Failed(reason) => {
                    self.emit(&TenantEvent::SourceFailed {
                        reason: reason.clone(),
                    });
                    return Resolution::Unresolved {
                        reason: Some(reason),
                    };
                }
            }
        }

        Resolution::Unresolved { reason: None }
    }

    /// Remove the configured key from `ctx`, clearing log metadata and
    /// reporting the removal. Idempotent.
    pub fn clear(&self, ctx: &mut TenantContext) {
        if let Some(tenant) = ctx.clear(&self.config.context_key) {
            if self.config.logger_metadata_enabled {
                self.log_context.clear(&self.config.context_key);
            }
            self.emit(&TenantEvent::Cleared { tenant });
        }
    }

    fn emit(&self, event: &TenantEvent) {
        if !self.config.observability_enabled {
            return;
        }
        match &self.sink {
            Some(sink) => sink.emit(event),
            None => events::emit(event),
        }
    }
}

impl std::fmt::Debug for TenantPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("TenantPipeline")
            .field("sources", &names)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`TenantPipeline`].
///
/// `build()` validates every source and the pipeline flags; an invalid
/// configuration is rejected before any request is processed. With no
/// sources configured, a default [`HeaderSource`] is used.
#[derive(Default)]
pub struct TenantPipelineBuilder {
    sources: Vec<Arc<dyn TenantSource>>,
    config: PipelineConfig,
    log_context: Option<Arc<dyn LogContext>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl TenantPipelineBuilder {
    /// Append a source; order of registration is order of evaluation.
    pub fn source(mut self, source: impl TenantSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Append an already-shared source.
    pub fn source_arc(mut self, source: Arc<dyn TenantSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Append sources from declarative configuration entries.
    pub fn sources_from_config(mut self, entries: impl IntoIterator<Item = SourceConfig>) -> Self {
        for entry in entries {
            self.sources.push(entry.into_source());
        }
        self
    }

    /// Replace the whole flag set at once.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context_key(mut self, key: impl Into<String>) -> Self {
        self.config.context_key = key.into();
        self
    }

    pub fn require_resolved(mut self, require_resolved: bool) -> Self {
        self.config.require_resolved = require_resolved;
        self
    }

    pub fn logger_metadata_enabled(mut self, enabled: bool) -> Self {
        self.config.logger_metadata_enabled = enabled;
        self
    }

    pub fn observability_enabled(mut self, enabled: bool) -> Self {
        self.config.observability_enabled = enabled;
        self
    }

    /// Replace the log-context collaborator (default: current-span
    /// recording).
    pub fn log_context(mut self, log_context: Arc<dyn LogContext>) -> Self {
        self.log_context = Some(log_context);
        self
    }

    /// Route this pipeline's events to a dedicated sink instead of the
    /// process-wide one.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<TenantPipeline, ConfigError> {
        self.config.validate()?;

        let sources = if self.sources.is_empty() {
            vec![Arc::new(HeaderSource::new()) as Arc<dyn TenantSource>]
        } else {
            self.sources
        };
        for source in &sources {
            source.validate()?;
        }

        Ok(TenantPipeline {
            sources,
            config: self.config,
            log_context: self
                .log_context
                .unwrap_or_else(|| Arc::new(SpanLogContext)),
            sink: self.sink,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
