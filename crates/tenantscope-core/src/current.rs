//! Ambient access to the current execution context
//!
//! A `tokio` task-local holds one [`TenantContext`] per scope. Middleware
//! establishes the scope around the request future; handlers, loggers and
//! anything else sharing the task read the resolved tenant through the free
//! functions here without threading it through every call.
//!
//! Outside a scope the functions behave as an empty, immutable context:
//! reads return `None`, writes are dropped. Concurrent tasks never observe
//! each other's entries; the only cross-task transfer is an explicit
//! snapshot handed to [`scope_with_snapshot`].

use std::cell::RefCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tokio::task::futures::TaskLocalFuture;

use crate::context::{ContextSnapshot, TenantContext};
use crate::error::{Error, Result};
use crate::events::{self, TenantEvent};
use crate::value::TenantValue;

tokio::task_local! {
    static CURRENT: RefCell<TenantContext>;
}

/// Future type produced by [`scope`] and [`scope_with_snapshot`].
pub type ScopedFuture<F> = TaskLocalFuture<RefCell<TenantContext>, F>;

/// Run `fut` with `ctx` as the current context.
pub fn scope<F: Future>(ctx: TenantContext, fut: F) -> ScopedFuture<F> {
    CURRENT.scope(RefCell::new(ctx), fut)
}

/// Run `fut` in a fresh context pre-populated from `snapshot`.
///
/// This is the handoff for background work: capture with [`snapshot`] in
/// the request task, move the snapshot into the spawned task, and wrap the
/// task body with this function.
///
/// # Example
/// ```
/// # async fn example() {
/// use tenantscope_core::current;
///
/// let snapshot = current::snapshot();
/// tokio::spawn(current::scope_with_snapshot(snapshot, async {
///     // sees the capturing task's tenant entries
///     let _tenant = current::get("tenant");
/// }));
/// # }
/// ```
pub fn scope_with_snapshot<F: Future>(
    snapshot: Option<ContextSnapshot>,
    fut: F,
) -> ScopedFuture<F> {
    let mut ctx = TenantContext::new();
    if let Some(snapshot) = &snapshot {
        ctx.apply_snapshot(Some(snapshot));
        events::emit(&TenantEvent::SnapshotApplied);
    }
    scope(ctx, fut)
}

/// Run `f` synchronously with `ctx` as the current context.
pub fn sync_scope<R>(ctx: TenantContext, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(RefCell::new(ctx), f)
}

/// Store a value in the current context. Dropped outside a scope.
pub fn set(key: impl Into<String>, value: impl Into<TenantValue>) {
    let key = key.into();
    let value = value.into();
    if CURRENT
        .try_with(|cell| {
            cell.borrow_mut().set(key.as_str(), value);
        })
        .is_err()
    {
        tracing::trace!(key = %key, "tenant context write outside an execution scope dropped");
    }
}

/// Read a value from the current context.
pub fn get(key: &str) -> Option<TenantValue> {
    CURRENT
        .try_with(|cell| cell.borrow().get(key).cloned())
        .ok()
        .flatten()
}

/// Strict read: absence (or no scope at all) is `Error::NotPresent`.
pub fn get_or_fail(key: &str) -> Result<TenantValue> {
    get(key).ok_or_else(|| Error::NotPresent(key.to_string()))
}

/// Remove a key from the current context. Idempotent.
pub fn clear(key: &str) -> Option<TenantValue> {
    CURRENT
        .try_with(|cell| cell.borrow_mut().clear(key))
        .ok()
        .flatten()
}

/// Whether the current context holds `key`.
pub fn present(key: &str) -> bool {
    CURRENT
        .try_with(|cell| cell.borrow().present(key))
        .unwrap_or(false)
}

/// Overwrite `key` for the duration of `f`, restoring the prior value (or
/// absence) on every exit path, including a panic inside `f`.
///
/// Outside a scope, `f` simply runs; there is nothing to restore.
pub fn with_temporary<R>(
    key: &str,
    value: impl Into<TenantValue>,
    f: impl FnOnce() -> R,
) -> R {
    let displaced = CURRENT
        .try_with(|cell| cell.borrow_mut().set(key, value.into()))
        .ok();

    let result = panic::catch_unwind(AssertUnwindSafe(f));

    if let Some(prior) = displaced {
        let _ = CURRENT.try_with(|cell| {
            let mut ctx = cell.borrow_mut();
            match prior {
                Some(previous) => {
                    ctx.set(key, previous);
                }
                None => {
                    ctx.clear(key);
                }
            }
        });
    }

    match result {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Capture the current context's entries.
///
/// Returns `None` outside a scope or when the context is empty. Emits
/// `context.snapshot_created` when a snapshot is produced.
pub fn snapshot() -> Option<ContextSnapshot> {
    let snapshot = CURRENT
        .try_with(|cell| cell.borrow().snapshot())
        .ok()
        .flatten();
    if snapshot.is_some() {
        events::emit(&TenantEvent::SnapshotCreated);
    }
    snapshot
}

/// Write every entry of `snapshot` into the current context.
///
/// No-op on `None` input or outside a scope. Emits
/// `context.snapshot_applied` when entries were applied.
pub fn apply_snapshot(snapshot: Option<&ContextSnapshot>) {
    let Some(snapshot) = snapshot else { return };
    let applied = CURRENT
        .try_with(|cell| cell.borrow_mut().apply_snapshot(Some(snapshot)))
        .is_ok();
    if applied {
        events::emit(&TenantEvent::SnapshotApplied);
    }
}
