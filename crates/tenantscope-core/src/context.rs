//! Per-execution-context tenant storage
//!
//! `TenantContext` is the key/value store scoped to one logical execution
//! unit (one request task, one background job). Contexts are never shared;
//! the only sanctioned cross-context transfer is an explicit
//! [`ContextSnapshot`]. See [`crate::current`] for the task-local wiring.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::value::TenantValue;

/// Key/value storage owned by exactly one execution context.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TenantContext {
    entries: HashMap<String, TenantValue>,
}

impl TenantContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, returning the displaced value if any.
    ///
    /// Unconditional overwrite; there are no error conditions.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<TenantValue>) -> Option<TenantValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Look up `key`. Absence is an ordinary outcome, not an error.
    pub fn get(&self, key: &str) -> Option<&TenantValue> {
        self.entries.get(key)
    }

    /// Strict lookup: absence is `Error::NotPresent`.
    pub fn get_or_fail(&self, key: &str) -> Result<&TenantValue> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::NotPresent(key.to_string()))
    }

    /// Remove `key`, returning the removed value. Idempotent.
    pub fn clear(&mut self, key: &str) -> Option<TenantValue> {
        self.entries.remove(key)
    }

    /// Whether `key` currently holds a value.
    pub fn present(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite `key` for the duration of `f`, restoring the prior value
    /// (or absence) on every exit path, including a panic inside `f`.
    ///
    /// # Example
    /// ```
    /// use tenantscope_core::TenantContext;
    ///
    /// let mut ctx = TenantContext::new();
    /// ctx.set("tenant", "outer");
    /// let seen = ctx.with_temporary("tenant", "inner", |ctx| {
    ///     ctx.get("tenant").unwrap().to_string()
    /// });
    /// assert_eq!(seen, "inner");
    /// assert_eq!(ctx.get("tenant").unwrap().to_string(), "outer");
    /// ```
    pub fn with_temporary<R>(
        &mut self,
        key: &str,
        value: impl Into<TenantValue>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let prior = self.entries.insert(key.to_string(), value.into());
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        match prior {
            Some(previous) => {
                self.entries.insert(key.to_string(), previous);
            }
            None => {
                self.entries.remove(key);
            }
        }
        match result {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Capture every entry of this context.
    ///
    /// Returns `None` for an empty context, never an empty snapshot. The
    /// capture is multi-key: any additional tenant-scoped entries travel
    /// together with the primary one.
    pub fn snapshot(&self) -> Option<ContextSnapshot> {
        if self.entries.is_empty() {
            None
        } else {
            Some(ContextSnapshot {
                entries: self.entries.clone(),
            })
        }
    }

    /// Write every entry of `snapshot` into this context. No-op on `None`.
    pub fn apply_snapshot(&mut self, snapshot: Option<&ContextSnapshot>) {
        if let Some(snapshot) = snapshot {
            for (key, value) in &snapshot.entries {
                self.entries.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Immutable capture of one context's entries, transferable to another
/// execution context.
///
/// Never empty by construction: `TenantContext::snapshot` returns `None`
/// instead of producing an empty snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    entries: HashMap<String, TenantValue>,
}

impl ContextSnapshot {
    /// Look up a captured entry.
    pub fn get(&self, key: &str) -> Option<&TenantValue> {
        self.entries.get(key)
    }

    /// Iterate over the captured entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TenantValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of captured entries (always at least one).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for iterator-adjacent API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let mut ctx = TenantContext::new();
        assert!(ctx.set("tenant", "acme").is_none());
        assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("acme")));
    }

    #[test]
    fn test_set_overwrites_and_returns_prior() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "first");
        let prior = ctx.set("tenant", "second");
        assert_eq!(prior, Some(TenantValue::from("first")));
        assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("second")));
    }

    #[test]
    fn test_get_absent_is_none() {
        let ctx = TenantContext::new();
        assert_eq!(ctx.get("tenant"), None);
    }

    #[test]
    fn test_get_or_fail_absent() {
        let ctx = TenantContext::new();
        let err = ctx.get_or_fail("tenant").unwrap_err();
        assert!(matches!(err, Error::NotPresent(key) if key == "tenant"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "acme");
        assert_eq!(ctx.clear("tenant"), Some(TenantValue::from("acme")));
        assert_eq!(ctx.clear("tenant"), None);
        assert!(!ctx.present("tenant"));
    }

    #[test]
    fn test_present() {
        let mut ctx = TenantContext::new();
        assert!(!ctx.present("tenant"));
        ctx.set("tenant", "acme");
        assert!(ctx.present("tenant"));
    }

    #[test]
    fn test_with_temporary_restores_prior_value() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "outer");
        ctx.with_temporary("tenant", "inner", |ctx| {
            assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("inner")));
        });
        assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("outer")));
    }

    #[test]
    fn test_with_temporary_restores_absence() {
        let mut ctx = TenantContext::new();
        ctx.with_temporary("tenant", "inner", |ctx| {
            assert!(ctx.present("tenant"));
        });
        assert!(!ctx.present("tenant"));
    }

    #[test]
    fn test_with_temporary_restores_on_panic() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "outer");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.with_temporary("tenant", "inner", |_| panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("outer")));
    }

    #[test]
    fn test_with_temporary_is_reentrant() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "a");
        ctx.with_temporary("tenant", "b", |ctx| {
            ctx.with_temporary("tenant", "c", |ctx| {
                assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("c")));
            });
            assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("b")));
        });
        assert_eq!(ctx.get("tenant"), Some(&TenantValue::from("a")));
    }

    #[test]
    fn test_snapshot_of_empty_context_is_none() {
        let ctx = TenantContext::new();
        assert!(ctx.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_captures_all_keys() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "acme");
        ctx.set("organization", "acme-corp");

        let snapshot = ctx.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("tenant"), Some(&TenantValue::from("acme")));
        assert_eq!(
            snapshot.get("organization"),
            Some(&TenantValue::from("acme-corp"))
        );
    }

    #[test]
    fn test_snapshot_roundtrip_is_identity() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "acme");
        ctx.set("organization", "acme-corp");

        let before = ctx.clone();
        let snapshot = ctx.snapshot();
        ctx.apply_snapshot(snapshot.as_ref());
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_apply_snapshot_none_is_noop() {
        let mut ctx = TenantContext::new();
        ctx.set("tenant", "acme");
        ctx.apply_snapshot(None);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_apply_snapshot_transfers_into_other_context() {
        let mut source = TenantContext::new();
        source.set("tenant", "acme");

        let snapshot = source.snapshot();
        let mut target = TenantContext::new();
        target.set("unrelated", "kept");
        target.apply_snapshot(snapshot.as_ref());

        assert_eq!(target.get("tenant"), Some(&TenantValue::from("acme")));
        assert_eq!(target.get("unrelated"), Some(&TenantValue::from("kept")));
    }
}
