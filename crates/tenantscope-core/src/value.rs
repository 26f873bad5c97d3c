//! Opaque tenant values

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The identifier of a resolved tenant.
///
/// Canonically a string, but claim payloads can carry numbers or booleans,
/// so the wrapper accepts any JSON value. The content is caller-supplied
/// request data and is never validated here.
///
/// # Example
/// ```
/// use tenantscope_core::TenantValue;
///
/// let tenant = TenantValue::from("acme");
/// assert_eq!(tenant.as_str(), Some("acme"));
/// assert_eq!(tenant.to_string(), "acme");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantValue(Value);

impl TenantValue {
    /// Wrap an arbitrary JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The string content, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Whether this value is JSON null.
    ///
    /// The resolution pipeline treats a null value as a miss, never as a
    /// resolved tenant.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Borrow the underlying JSON value.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value.
    pub fn into_json(self) -> Value {
        self.0
    }
}

impl fmt::Display for TenantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            // Strings render bare so log fields read "acme", not "\"acme\""
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<Value> for TenantValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for TenantValue {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<String> for TenantValue {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<i64> for TenantValue {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<bool> for TenantValue {
    fn from(value: bool) -> Self {
        Self(Value::Bool(value))
    }
}
