//! Tenant resolution pipeline and extraction sources
//!
//! An ordered chain of pluggable sources inspects each request until one
//! produces a tenant:
//! - [`HeaderSource`]: a configurable request header
//! - [`SubdomainSource`]: a label of the request host
//! - [`ClaimSource`]: a claim inside a JWT-style bearer token or cookie
//!
//! [`TenantPipeline`] drives the chain with first-success-wins semantics,
//! fail-fast on structured failures, and recovery from panicking sources.
//! Custom sources implement [`TenantSource`].

pub mod claim;
pub mod config;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod source;
pub mod subdomain;

pub use claim::ClaimSource;
pub use config::{PipelineConfig, SourceConfig};
pub use error::ConfigError;
pub use header::HeaderSource;
pub use pipeline::{Resolution, TenantPipeline, TenantPipelineBuilder};
pub use source::{Outcome, TenantSource, Transform, TransformError};
pub use subdomain::{SubdomainPosition, SubdomainSource};
