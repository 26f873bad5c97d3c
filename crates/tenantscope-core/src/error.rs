//! Error types for Tenantscope Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Strict context lookup on a key that holds no value.
    ///
    /// Only `TenantContext::get_or_fail` and `current::get_or_fail` produce
    /// this; the plain accessors return `Option` instead.
    #[error("Context key not present: {0}")]
    NotPresent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
