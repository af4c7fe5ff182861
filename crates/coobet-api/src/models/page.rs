use serde::{Deserialize, Serialize};

/// Paginated list envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    #[inline]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}
