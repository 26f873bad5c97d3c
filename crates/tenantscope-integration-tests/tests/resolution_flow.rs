//! Full request flow through the middleware and pipeline

use axum::body::Body;
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tenantscope_core::current;
use tenantscope_middleware::TenantLayer;
use tenantscope_resolve::{
    ClaimSource, HeaderSource, SubdomainSource, TenantPipeline,
};

fn unsigned_token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"alg": "none"})).unwrap());
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    format!("{header}.{payload}")
}

async fn tenant_echo() -> String {
    current::get("tenant")
        .map(|tenant| tenant.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Header, then subdomain, then claim: the order used in the assertions
/// below.
fn full_chain(require_resolved: bool) -> Router {
    let pipeline = TenantPipeline::builder()
        .source(HeaderSource::new())
        .source(SubdomainSource::new())
        .source(ClaimSource::new().with_claim("user.tenant_id"))
        .require_resolved(require_resolved)
        .observability_enabled(false)
        .build()
        .unwrap();

    Router::new()
        .route("/", get(tenant_echo))
        .layer(TenantLayer::new(pipeline))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    use tower::ServiceExt;
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_header_wins_over_later_sources() {
    let request = Request::builder()
        .uri("/")
        .header("x-tenant-id", "from-header")
        .header("host", "from-subdomain.example.com")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(full_chain(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "from-header");
}

#[tokio::test]
async fn test_subdomain_fallback() {
    let request = Request::builder()
        .uri("/")
        .header("host", "acme.example.com")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(full_chain(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "acme");
}

#[tokio::test]
async fn test_excluded_subdomain_falls_through_to_claim() {
    let token = unsigned_token(json!({"user": {"tenant_id": "nested-tenant"}}));
    let request = Request::builder()
        .uri("/")
        .header("host", "www.example.com")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(full_chain(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "nested-tenant");
}

#[tokio::test]
async fn test_nothing_matches_without_requirement() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(full_chain(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "none");
}

#[tokio::test]
async fn test_nothing_matches_with_requirement_halts() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(full_chain(true), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("tenant_unresolved"));
    assert!(body.contains("No tenant source matched the request"));
}

#[tokio::test]
async fn test_no_sources_with_requirement_halts() {
    // default pipeline carries a header source; an empty header set
    // resolves nothing
    let pipeline = TenantPipeline::builder()
        .require_resolved(true)
        .observability_enabled(false)
        .build()
        .unwrap();
    let app = Router::new()
        .route("/", get(tenant_echo))
        .layer(TenantLayer::new(pipeline));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_token_halts_with_reason() {
    let pipeline = TenantPipeline::builder()
        .source(ClaimSource::new())
        .require_resolved(true)
        .observability_enabled(false)
        .build()
        .unwrap();
    let app = Router::new()
        .route("/", get(tenant_echo))
        .layer(TenantLayer::new(pipeline));

    let request = Request::builder()
        .uri("/")
        .header("authorization", "Bearer header.!!!bad-base64!!!")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("base64"));
}

#[tokio::test]
async fn test_malformed_token_tolerated_when_not_required() {
    let pipeline = TenantPipeline::builder()
        .source(ClaimSource::new())
        .observability_enabled(false)
        .build()
        .unwrap();
    let app = Router::new()
        .route("/", get(tenant_echo))
        .layer(TenantLayer::new(pipeline));

    let request = Request::builder()
        .uri("/")
        .header("authorization", "Bearer header.!!!bad-base64!!!")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "none");
}

#[tokio::test]
async fn test_cookie_token_flow() {
    let pipeline = TenantPipeline::builder()
        .source(ClaimSource::new().with_cookie("access_token"))
        .observability_enabled(false)
        .build()
        .unwrap();
    let app = Router::new()
        .route("/", get(tenant_echo))
        .layer(TenantLayer::new(pipeline));

    let token = unsigned_token(json!({"tenant_id": "cookie-tenant"}));
    let request = Request::builder()
        .uri("/")
        .header("cookie", format!("session=abc; access_token={token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "cookie-tenant");
}

#[tokio::test]
async fn test_custom_context_key_is_ambient() {
    let pipeline = TenantPipeline::builder()
        .source(HeaderSource::new())
        .context_key("organization")
        .observability_enabled(false)
        .build()
        .unwrap();

    async fn organization_echo() -> String {
        current::get("organization")
            .map(|tenant| tenant.to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    let app = Router::new()
        .route("/", get(organization_echo))
        .layer(TenantLayer::new(pipeline));

    let request = Request::builder()
        .uri("/")
        .header("x-tenant-id", "acme")
        .body(Body::empty())
        .unwrap();

    let (_, body) = send(app, request).await;
    assert_eq!(body, "acme");
}

#[tokio::test]
async fn test_verified_token_flow() {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let secret = "shared-secret";
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"alg": "HS256"})).unwrap());
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"tenant_id": "signed-tenant"})).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    let token = format!("{header}.{payload}.{signature}");

    let pipeline = TenantPipeline::builder()
        .source(ClaimSource::new().with_verification(secret))
        .require_resolved(true)
        .observability_enabled(false)
        .build()
        .unwrap();
    let app = Router::new()
        .route("/", get(tenant_echo))
        .layer(TenantLayer::new(pipeline));

    let request = Request::builder()
        .uri("/")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "signed-tenant");

    // tampering with the payload invalidates the signature
    let forged_payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"tenant_id": "forged"})).unwrap());
    let forged = format!("{header}.{forged_payload}.{signature}");
    let request = Request::builder()
        .uri("/")
        .header("authorization", format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("JWT verification failed"));
}

#[tokio::test]
async fn test_concurrent_requests_resolve_independently() {
    use tower::ServiceExt;

    let app = full_chain(false);
    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .uri("/")
                .header("x-tenant-id", format!("tenant-{i}"))
                .body(Body::empty())
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            (i, String::from_utf8(bytes.to_vec()).unwrap())
        }));
    }

    for handle in handles {
        let (i, body) = handle.await.unwrap();
        assert_eq!(body, format!("tenant-{i}"));
    }
}
