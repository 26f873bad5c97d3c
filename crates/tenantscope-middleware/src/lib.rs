//! Tower middleware for tenant resolution
//!
//! Wraps services with the resolution pipeline: each request gets a fresh
//! tenant context, the pipeline runs against the request's headers,
//! cookies and host, and the inner service executes inside a task-local
//! scope so handlers (and work they spawn, via snapshots) see the
//! resolved tenant ambiently.
//!
//! ```rust,ignore
//! use axum::Router;
//! use tenantscope_middleware::TenantLayer;
//! use tenantscope_resolve::{HeaderSource, SubdomainSource, TenantPipeline};
//!
//! let pipeline = TenantPipeline::builder()
//!     .source(HeaderSource::new())
//!     .source(SubdomainSource::new())
//!     .build()?;
//!
//! let app = Router::new()
//!     .route("/", axum::routing::get(handler))
//!     .layer(TenantLayer::new(pipeline));
//! ```

pub mod layer;
pub mod reject;
pub mod request;
pub mod service;

pub use layer::TenantLayer;
pub use reject::RejectBody;
pub use request::HttpRequest;
pub use service::{TenantService, TenantServiceFuture};
