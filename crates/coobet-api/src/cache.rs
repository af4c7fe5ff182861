//! In-memory query cache.
//!
//! List endpoints read through it; mutations invalidate by key prefix, and a
//! session wipe clears it entirely.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

/// Cache key: an ordered list of segments, e.g. `["transactions", "{\"page\":2}"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Key for a resource plus its serialized filters.
    pub fn with_params<P: Serialize + ?Sized>(resource: &str, params: &P) -> crate::Result<Self> {
        Ok(Self(vec![
            resource.to_string(),
            serde_json::to_string(params)?,
        ]))
    }

    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.0.len() && self.0.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, or `None` when absent or no longer decodable as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.entries.read().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(v) => {
                trace!(?key, "Query cache hit");
                Some(v)
            }
            Err(_) => None,
        }
    }

    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) -> crate::Result<()> {
        let value = serde_json::to_value(value)?;
        self.entries.write().insert(key, value);
        Ok(())
    }

    /// Drop every entry whose key starts with `prefix`. Returns how many were dropped.
    pub fn invalidate(&self, prefix: &[&str]) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(?prefix, removed, "Invalidated cached queries");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
