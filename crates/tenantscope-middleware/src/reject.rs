//! Halt response for unresolved-but-required requests

use http::{Response, StatusCode};
use serde::Serialize;

/// JSON body of the 400 response produced when `require_resolved` is set
/// and no source matched.
///
/// ```json
/// {
///     "error": "tenant_unresolved",
///     "message": "No tenant source matched the request"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct RejectBody {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message; carries the source failure reason when
    /// there is one.
    pub message: String,
}

impl RejectBody {
    pub fn unresolved(reason: Option<&str>) -> Self {
        Self {
            error: "tenant_unresolved".to_string(),
            message: reason
                .unwrap_or("No tenant source matched the request")
                .to_string(),
        }
    }
}

/// Build the halt response. Generic over the body so it composes with any
/// service whose response body converts from a `String`.
pub(crate) fn reject_response<ResBody: From<String>>(reason: Option<&str>) -> Response<ResBody> {
    let body = RejectBody::unresolved(reason);
    let json = serde_json::to_string(&body)
        .unwrap_or_else(|_| r#"{"error":"tenant_unresolved"}"#.to_string());

    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(ResBody::from(json))
        .unwrap_or_else(|_| {
            let mut response = Response::new(ResBody::from(String::new()));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            response
        })
}
