//! Tower Service driving the resolution pipeline

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{Request, Response};
use pin_project_lite::pin_project;
use tenantscope_core::current::{self, ScopedFuture};
use tenantscope_core::TenantContext;
use tenantscope_resolve::{Resolution, TenantPipeline};
use tower::Service;

use crate::reject::reject_response;
use crate::request::HttpRequest;

/// Service wrapper that resolves the tenant before the inner service runs.
///
/// Per request it:
/// 1. runs the pipeline against the request's headers, cookies and host
/// 2. on success, inserts the [`TenantValue`] into request extensions
/// 3. drives the inner service inside a task-local context scope, so
///    handler code reads the tenant through `tenantscope_core::current`
/// 4. on an unresolved pass with `require_resolved`, halts with a 400
///    and never calls the inner service
#[derive(Debug, Clone)]
pub struct TenantService<S> {
    inner: S,
    pipeline: Arc<TenantPipeline>,
}

impl<S> TenantService<S> {
    pub fn new(inner: S, pipeline: Arc<TenantPipeline>) -> Self {
        Self { inner, pipeline }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TenantService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = TenantServiceFuture<S, ReqBody, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut ctx = TenantContext::new();
        let resolution = self.pipeline.resolve(&HttpRequest::new(&req), &mut ctx);

        match resolution {
            Resolution::Resolved { tenant, source } => {
                tracing::debug!(tenant = %tenant, source = %source, "tenant context established");
                req.extensions_mut().insert(tenant);
            }
            Resolution::Unresolved { reason } => {
                if self.pipeline.config().require_resolved {
                    tracing::warn!(
                        reason = reason.as_deref().unwrap_or("no source matched"),
                        "tenant required but unresolved; halting request"
                    );
                    return TenantServiceFuture::Halt {
                        response: Some(reject_response(reason.as_deref())),
                    };
                }
            }
        }

        // the clone keeps `self.inner` ready for the next call
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);
        TenantServiceFuture::Scoped {
            future: current::scope(ctx, inner.call(req)),
        }
    }
}

pin_project! {
    /// Future for [`TenantService`].
    #[project = TenantServiceFutureProj]
    pub enum TenantServiceFuture<S, ReqBody, ResBody>
    where
        S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    {
        /// Resolution was required and failed; respond without calling the
        /// inner service.
        Halt { response: Option<Response<ResBody>> },
        /// Inner service future, wrapped in the task-local context scope.
        Scoped {
            #[pin]
            future: ScopedFuture<S::Future>,
        },
    }
}

impl<S, ReqBody, ResBody> Future for TenantServiceFuture<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: From<String>,
{
    type Output = Result<Response<ResBody>, S::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            TenantServiceFutureProj::Halt { response } => {
                let response = response.take().unwrap_or_else(|| reject_response(None));
                Poll::Ready(Ok(response))
            }
            TenantServiceFutureProj::Scoped { future } => future.poll(cx),
        }
    }
}
