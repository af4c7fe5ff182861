//! Outgoing request descriptors and retry bookkeeping.

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;

pub use reqwest::Method;

use crate::error::Result;

/// Maximum number of replays after a credential refresh.
pub const MAX_RETRIES: u32 = 1;

/// One API call before it is handed to the transport.
///
/// `path` is relative to the configured base URL.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Append query parameters from any serializable struct or map.
    ///
    /// `None` fields and nulls are skipped, arrays become repeated keys.
    pub fn with_query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self> {
        if let Value::Object(map) = serde_json::to_value(params)? {
            for (key, value) in map {
                push_query_value(&mut self.query, &key, value);
            }
        }
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Replace any `Authorization` header with `Bearer <token>`.
    pub fn set_bearer(&mut self, token: &str) {
        self.remove_header(AUTHORIZATION.as_str());
        self.headers
            .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
    }

    /// The bearer credential currently attached, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.header(AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }
}

// Header values carry credentials, keep them out of logs.
impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field(
                "headers",
                &self.headers.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

fn push_query_value(query: &mut Vec<(String, String)>, key: &str, value: Value) {
    match value {
        Value::Null => {}
        Value::String(s) => query.push((key.to_string(), s)),
        Value::Array(items) => {
            for item in items {
                push_query_value(query, key, item);
            }
        }
        other => query.push((key.to_string(), other.to_string())),
    }
}

/// A request together with the number of times it has been replayed.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    descriptor: RequestDescriptor,
    retries: u32,
}

impl RequestAttempt {
    pub fn new(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            retries: 0,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }

    #[inline]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether this attempt has already been replayed once.
    #[inline]
    pub fn is_retry(&self) -> bool {
        self.retries > 0
    }

    #[inline]
    pub fn can_retry(&self) -> bool {
        self.retries < MAX_RETRIES
    }

    /// Record a replay. Returns `false` without counting when the budget is spent.
    pub fn mark_retry(&mut self) -> bool {
        if !self.can_retry() {
            return false;
        }
        self.retries += 1;
        true
    }
}
