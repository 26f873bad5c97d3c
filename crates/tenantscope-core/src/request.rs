//! Abstract request surface
//!
//! Extraction sources see requests only through [`RequestView`]: an
//! ordered header list, a cookie accessor and a host value. Nothing else
//! about the host framework leaks in; `tenantscope-middleware` adapts
//! `http::Request`, and [`StaticRequest`] serves tests and non-HTTP hosts.

use std::collections::HashMap;

/// The request capabilities the resolution pipeline consumes.
pub trait RequestView {
    /// All (name, value) header pairs in wire order. Names keep whatever
    /// casing the host delivers; matching policy belongs to the caller.
    fn header_pairs(&self) -> Vec<(&str, &str)>;

    /// Look up a cookie by exact name.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// The request host, if the host framework knows it.
    fn host(&self) -> Option<&str>;

    /// First header matching `name` in wire order, folding ASCII case
    /// unless `case_sensitive`.
    fn header(&self, name: &str, case_sensitive: bool) -> Option<&str> {
        self.header_pairs().into_iter().find_map(|(n, v)| {
            let matches = if case_sensitive {
                n == name
            } else {
                n.eq_ignore_ascii_case(name)
            };
            matches.then_some(v)
        })
    }
}

/// In-memory request for tests and non-HTTP hosts.
///
/// # Example
/// ```
/// use tenantscope_core::{RequestView, StaticRequest};
///
/// let request = StaticRequest::new()
///     .with_header("X-Tenant-Id", "acme")
///     .with_host("acme.example.com");
/// assert_eq!(request.header("x-tenant-id", false), Some("acme"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct StaticRequest {
    headers: Vec<(String, String)>,
    cookies: HashMap<String, String>,
    host: Option<String>,
}

impl StaticRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header; repeated names keep their relative order.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

impl RequestView for StaticRequest {
    fn header_pairs(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect()
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_folds_case_by_default() {
        let request = StaticRequest::new().with_header("X-Tenant-Id", "acme");
        assert_eq!(request.header("x-tenant-id", false), Some("acme"));
        assert_eq!(request.header("X-TENANT-ID", false), Some("acme"));
    }

    #[test]
    fn test_case_sensitive_lookup() {
        let request = StaticRequest::new().with_header("X-Tenant-Id", "acme");
        assert_eq!(request.header("X-Tenant-Id", true), Some("acme"));
        assert_eq!(request.header("x-tenant-id", true), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let request = StaticRequest::new()
            .with_header("x-tenant-id", "first")
            .with_header("x-tenant-id", "second");
        assert_eq!(request.header("x-tenant-id", false), Some("first"));
    }

    #[test]
    fn test_missing_header() {
        let request = StaticRequest::new();
        assert_eq!(request.header("x-tenant-id", false), None);
    }

    #[test]
    fn test_cookie_and_host() {
        let request = StaticRequest::new()
            .with_cookie("session", "token")
            .with_host("acme.example.com");
        assert_eq!(request.cookie("session"), Some("token"));
        assert_eq!(request.cookie("other"), None);
        assert_eq!(request.host(), Some("acme.example.com"));
    }
}
