//! Extraction source contract

use std::sync::Arc;

use tenantscope_core::{RequestView, TenantValue};

use crate::error::ConfigError;

/// Result of one extraction attempt.
///
/// Expected misses are `NotFound`, never errors; `Failed` means the source
/// had applicable data but could not extract from it (malformed token,
/// transform error). Sources do not panic for either case.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A tenant value was extracted.
    Found(TenantValue),
    /// The source had no applicable data.
    NotFound,
    /// Extraction was attempted and failed; the reason is human-readable.
    Failed(String),
}

impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    /// The extracted tenant, if any.
    pub fn found(self) -> Option<TenantValue> {
        match self {
            Outcome::Found(tenant) => Some(tenant),
            _ => None,
        }
    }
}

/// Error produced by a user-supplied transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// User-supplied post-processing of an extracted value.
///
/// An `Err` becomes an `Outcome::Failed` with a source-specific message;
/// it never escapes the pipeline.
pub type Transform = Arc<dyn Fn(TenantValue) -> Result<TenantValue, TransformError> + Send + Sync>;

/// One pluggable extraction behavior.
///
/// Built-in implementations cover headers, subdomains and token claims;
/// anything implementing this trait slots into the pipeline the same way.
/// `extract` must be synchronous and I/O-free for the built-ins; a custom
/// source that blocks is the caller's concern.
pub trait TenantSource: Send + Sync {
    /// Short identifier used in events and logs.
    fn name(&self) -> &str;

    /// Check configured options. Run once at pipeline construction;
    /// a failure here prevents the pipeline from being built at all.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Inspect the request and report an outcome.
    fn extract(&self, request: &dyn RequestView) -> Outcome;
}

/// Shared transform application with a per-source message prefix.
pub(crate) fn apply_transform(
    transform: Option<&Transform>,
    value: TenantValue,
    failure_prefix: &str,
) -> Outcome {
    match transform {
        Some(transform) => match transform(value) {
            Ok(value) => Outcome::Found(value),
            Err(err) => Outcome::Failed(format!("{failure_prefix}: {err}")),
        },
        None => Outcome::Found(value),
    }
}
