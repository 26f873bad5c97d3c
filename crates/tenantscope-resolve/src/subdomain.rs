//! Subdomain extraction source

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tenantscope_core::{RequestView, TenantValue};

use crate::error::ConfigError;
use crate::source::{apply_transform, Outcome, TenantSource, Transform, TransformError};

fn default_exclude() -> Vec<String> {
    vec!["www".to_string(), "api".to_string(), "admin".to_string()]
}

fn default_min_parts() -> usize {
    3
}

/// Which host label carries the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubdomainPosition {
    /// The leftmost label, valid only when the host has a genuine
    /// subdomain beyond domain + TLD (three labels or more).
    #[default]
    First,
    /// The rightmost non-excluded label before domain + TLD.
    Last,
    /// A fixed index into the full label list.
    Fixed(usize),
}

impl Serialize for SubdomainPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SubdomainPosition::First => serializer.serialize_str("first"),
            SubdomainPosition::Last => serializer.serialize_str("last"),
            SubdomainPosition::Fixed(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl<'de> Deserialize<'de> for SubdomainPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl Visitor<'_> for PositionVisitor {
            type Value = SubdomainPosition;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"first\", \"last\", or a non-negative label index")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                match value {
                    "first" => Ok(SubdomainPosition::First),
                    "last" => Ok(SubdomainPosition::Last),
                    other => Err(E::unknown_variant(other, &["first", "last"])),
                }
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(SubdomainPosition::Fixed(value as usize))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                usize::try_from(value)
                    .map(SubdomainPosition::Fixed)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
            }
        }

        deserializer.deserialize_any(PositionVisitor)
    }
}

/// Extracts the tenant from a label of the request host.
///
/// The host is read from the request, the `:port` suffix dropped, and the
/// remainder split on `.`. Hosts with fewer than `min_parts` labels never
/// match. Dotted IPv4 hosts are treated as ordinary labels.
///
/// # Example
/// ```
/// use tenantscope_core::{StaticRequest, TenantValue};
/// use tenantscope_resolve::{Outcome, SubdomainSource, TenantSource};
///
/// let source = SubdomainSource::new();
/// let request = StaticRequest::new().with_host("acme.example.com");
/// assert_eq!(source.extract(&request), Outcome::Found(TenantValue::from("acme")));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct SubdomainSource {
    /// Labels that never resolve as tenants. Default: `www`, `api`,
    /// `admin`.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Which label to take. Default: first.
    #[serde(default)]
    pub position: SubdomainPosition,

    /// Minimum label count for the host to be considered at all.
    /// Default: 3.
    #[serde(default = "default_min_parts")]
    pub min_parts: usize,

    /// Optional post-processing of the extracted label.
    #[serde(skip)]
    pub transform: Option<Transform>,
}

impl SubdomainSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude(mut self, exclude: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_position(mut self, position: SubdomainPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_min_parts(mut self, min_parts: usize) -> Self {
        self.min_parts = min_parts;
        self
    }

    pub fn with_transform(
        mut self,
        transform: impl Fn(TenantValue) -> Result<TenantValue, TransformError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(std::sync::Arc::new(transform));
        self
    }

    fn is_excluded(&self, label: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == label)
    }

    fn pick_label<'h>(&self, parts: &[&'h str]) -> Option<&'h str> {
        match self.position {
            SubdomainPosition::First => {
                // only a host with domain + TLD behind it has a subdomain
                if parts.len() < 3 {
                    return None;
                }
                let first = parts[0];
                (!self.is_excluded(first)).then_some(first)
            }
            SubdomainPosition::Last => {
                let candidates = &parts[..parts.len().checked_sub(2)?];
                candidates
                    .iter()
                    .rev()
                    .find(|label| !self.is_excluded(label))
                    .copied()
            }
            SubdomainPosition::Fixed(index) => {
                let limit = parts.len().checked_sub(2)?;
                (index < limit).then(|| parts[index])
            }
        }
    }
}

impl Default for SubdomainSource {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            position: SubdomainPosition::default(),
            min_parts: default_min_parts(),
            transform: None,
        }
    }
}

impl fmt::Debug for SubdomainSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubdomainSource")
            .field("exclude", &self.exclude)
            .field("position", &self.position)
            .field("min_parts", &self.min_parts)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl TenantSource for SubdomainSource {
    fn name(&self) -> &str {
        "subdomain"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_parts < 2 {
            return Err(ConfigError::MinPartsTooSmall(self.min_parts));
        }
        Ok(())
    }

    fn extract(&self, request: &dyn RequestView) -> Outcome {
        let Some(host) = request.host() else {
            return Outcome::NotFound;
        };
        let host = host.split(':').next().unwrap_or(host);
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() < self.min_parts {
            return Outcome::NotFound;
        }
        let Some(label) = self.pick_label(&parts) else {
            return Outcome::NotFound;
        };
        apply_transform(
            self.transform.as_ref(),
            TenantValue::from(label),
            "Subdomain transformation failed",
        )
    }
}
