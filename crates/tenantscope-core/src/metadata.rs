//! Logger metadata hook
//!
//! The pipeline pushes the resolved tenant into log context through this
//! interface; the collaborator owns the actual formatting. The default
//! implementation records onto the current `tracing` span.

use crate::value::TenantValue;

/// Log-context collaborator interface.
pub trait LogContext: Send + Sync {
    /// Attach `value` to the log context under `key`.
    fn set(&self, key: &str, value: &TenantValue);

    /// Remove `key` from the log context.
    fn clear(&self, key: &str);
}

/// Records the tenant as a field on the current `tracing` span.
///
/// Per the `tracing` contract, the field must be declared on the span up
/// front (typically as `tracing::field::Empty` on the host's request
/// span); recording an undeclared field is silently ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpanLogContext;

impl LogContext for SpanLogContext {
    fn set(&self, key: &str, value: &TenantValue) {
        tracing::Span::current().record(key, tracing::field::display(value));
    }

    fn clear(&self, key: &str) {
        tracing::Span::current().record(key, tracing::field::Empty);
    }
}

/// Discards all metadata. Useful in tests and for hosts that opt out.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogContext;

impl LogContext for NoopLogContext {
    fn set(&self, _key: &str, _value: &TenantValue) {}

    fn clear(&self, _key: &str) {}
}
