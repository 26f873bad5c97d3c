//! Pipeline configuration
//!
//! Everything here is validated when the pipeline is built and immutable
//! afterwards; a built pipeline can be shared read-only by any number of
//! in-flight requests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::claim::ClaimSource;
use crate::error::ConfigError;
use crate::header::HeaderSource;
use crate::source::TenantSource;
use crate::subdomain::SubdomainSource;

fn default_context_key() -> String {
    "tenant".to_string()
}

fn default_true() -> bool {
    true
}

/// Pipeline-level flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Context key the resolved tenant is stored under.
    /// Default: `tenant`.
    #[serde(default = "default_context_key")]
    pub context_key: String,

    /// Reject the request with a 400-equivalent when no source resolves.
    /// Default: false.
    #[serde(default)]
    pub require_resolved: bool,

    /// Push the resolved tenant into log context. Default: true.
    #[serde(default = "default_true")]
    pub logger_metadata_enabled: bool,

    /// Emit resolution events. Default: true.
    #[serde(default = "default_true")]
    pub observability_enabled: bool,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_key.is_empty() {
            return Err(ConfigError::EmptyContextKey);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_key: default_context_key(),
            require_resolved: false,
            logger_metadata_enabled: true,
            observability_enabled: true,
        }
    }
}

/// Declarative source entry for configuration files.
///
/// Deserializes from a tagged source list:
///
/// ```yaml
/// sources:
///   - type: subdomain
///     position: last
///   - type: header
///     header_name: x-org-id
/// ```
///
/// Transforms are code, not configuration; attach them through the
/// builder API instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceConfig {
    Header(HeaderSource),
    Subdomain(SubdomainSource),
    Claim(ClaimSource),
}

impl SourceConfig {
    /// Turn the configuration entry into a pipeline-ready source.
    pub fn into_source(self) -> Arc<dyn TenantSource> {
        match self {
            SourceConfig::Header(source) => Arc::new(source),
            SourceConfig::Subdomain(source) => Arc::new(source),
            SourceConfig::Claim(source) => Arc::new(source),
        }
    }
}
