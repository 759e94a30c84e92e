//! Offset pagination (`?skip=&limit=`).

use serde::{Deserialize, Serialize};

/// Default number of items returned by a listing.
pub const DEFAULT_LIMIT: usize = 100;

/// Upper bound on `limit`.
pub const MAX_LIMIT: usize = 1000;

/// Pagination parameters from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Number of items to skip.
    #[serde(default)]
    pub skip: usize,
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Create new pagination parameters, clamping `limit` to `1..=MAX_LIMIT`.
    pub fn new(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Normalize parameters to valid ranges.
    pub fn normalized(self) -> Self {
        Self::new(self.skip, self.limit)
    }

    /// Apply the page to an iterator.
    pub fn apply<I: IntoIterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        let page = self.normalized();
        items.into_iter().skip(page.skip).take(page.limit)
    }
}
