//! Header extraction source

use std::fmt;

use serde::{Deserialize, Serialize};
use tenantscope_core::{RequestView, TenantValue};

use crate::error::ConfigError;
use crate::source::{apply_transform, Outcome, TenantSource, Transform, TransformError};

fn default_header_name() -> String {
    "x-tenant-id".to_string()
}

/// Extracts the tenant from a request header.
///
/// Matching folds ASCII case by default; the first occurrence in wire
/// order wins when the header repeats. An empty value is a miss, not a
/// failure.
///
/// # Example
/// ```
/// use tenantscope_core::StaticRequest;
/// use tenantscope_resolve::{HeaderSource, TenantSource};
///
/// let source = HeaderSource::new().with_header_name("x-org-id");
/// let request = StaticRequest::new().with_header("X-Org-Id", "acme");
/// assert!(source.extract(&request).is_found());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct HeaderSource {
    /// Header to read. Default: `x-tenant-id`.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Require an exact-case name match. Default: false.
    #[serde(default)]
    pub case_sensitive: bool,

    /// Optional post-processing of the extracted value.
    #[serde(skip)]
    pub transform: Option<Transform>,
}

impl HeaderSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_transform(
        mut self,
        transform: impl Fn(TenantValue) -> Result<TenantValue, TransformError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(std::sync::Arc::new(transform));
        self
    }
}

impl Default for HeaderSource {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            case_sensitive: false,
            transform: None,
        }
    }
}

impl fmt::Debug for HeaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderSource")
            .field("header_name", &self.header_name)
            .field("case_sensitive", &self.case_sensitive)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl TenantSource for HeaderSource {
    fn name(&self) -> &str {
        "header"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.header_name.is_empty() {
            return Err(ConfigError::EmptyHeaderName);
        }
        Ok(())
    }

    fn extract(&self, request: &dyn RequestView) -> Outcome {
        let Some(raw) = request.header(&self.header_name, self.case_sensitive) else {
            return Outcome::NotFound;
        };
        if raw.is_empty() {
            return Outcome::NotFound;
        }
        apply_transform(
            self.transform.as_ref(),
            TenantValue::from(raw),
            "Header transformation failed",
        )
    }
}
