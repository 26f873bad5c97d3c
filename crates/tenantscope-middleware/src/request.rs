//! `http::Request` adapter for the abstract request surface

use http::Request;
use tenantscope_core::RequestView;

/// Borrowing view over an `http::Request`.
///
/// Header names arrive lowercased (the `http` crate normalizes them), so
/// case-insensitive lookups match trivially and case-sensitive lookups
/// should use lowercase names. Non-UTF-8 header values are skipped.
#[derive(Debug)]
pub struct HttpRequest<'a, B> {
    inner: &'a Request<B>,
}

impl<'a, B> HttpRequest<'a, B> {
    pub fn new(inner: &'a Request<B>) -> Self {
        Self { inner }
    }
}

impl<B> RequestView for HttpRequest<'_, B> {
    fn header_pairs(&self) -> Vec<(&str, &str)> {
        self.inner
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect()
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        let raw = self
            .inner
            .headers()
            .get(http::header::COOKIE)?
            .to_str()
            .ok()?;
        raw.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }

    fn host(&self) -> Option<&str> {
        self.inner
            .headers()
            .get(http::header::HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| self.inner.uri().host())
    }
}
