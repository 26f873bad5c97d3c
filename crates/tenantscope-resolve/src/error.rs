//! Configuration errors
//!
//! Every variant corresponds to one violated constraint, checked once when
//! the pipeline is built. Nothing here can occur at request time.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("header_name must not be empty")]
    EmptyHeaderName,

    #[error("min_parts must be an integer >= 2, got {0}")]
    MinPartsTooSmall(usize),

    #[error("token header must not be empty")]
    EmptyTokenHeader,

    #[error("cookie must not be empty when configured")]
    EmptyCookieName,

    #[error("claim must not be empty")]
    EmptyClaimPath,

    #[error("secret is required when verify is enabled")]
    SecretRequired,

    #[error("context_key must not be empty")]
    EmptyContextKey,
}
