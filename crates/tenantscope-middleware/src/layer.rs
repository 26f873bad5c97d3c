//! Tower Layer wiring the pipeline into a service stack

use std::sync::Arc;

use tenantscope_resolve::TenantPipeline;
use tower::Layer;

use crate::service::TenantService;

/// Layer that adds tenant resolution to every wrapped service.
///
/// The pipeline is built once, validated up front, and shared read-only by
/// all requests.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{routing::get, Router};
/// use tenantscope_middleware::TenantLayer;
/// use tenantscope_resolve::TenantPipeline;
///
/// let pipeline = TenantPipeline::builder().build()?;
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(TenantLayer::new(pipeline));
/// ```
#[derive(Debug, Clone)]
pub struct TenantLayer {
    pipeline: Arc<TenantPipeline>,
}

impl TenantLayer {
    /// Wrap a built pipeline.
    pub fn new(pipeline: TenantPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Wrap an already-shared pipeline.
    pub fn from_shared(pipeline: Arc<TenantPipeline>) -> Self {
        Self { pipeline }
    }

    /// The pipeline this layer installs.
    pub fn pipeline(&self) -> &TenantPipeline {
        &self.pipeline
    }
}

impl<S> Layer<S> for TenantLayer {
    type Service = TenantService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantService::new(inner, Arc::clone(&self.pipeline))
    }
}
