// SPDX-License-Identifier: MIT OR Apache-2.0
//! List pagination: defensive parameter clamping and the page wrapper.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 20;

/// Hard cap on page size for REST list endpoints.
pub const MAX_LIMIT: usize = 200;

/// Clamped pagination parameters.
///
/// Out-of-range or unparseable inputs fall back to the defaults rather than
/// failing the request; an offset past the total yields an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// Items to skip.
    pub offset: usize,
    /// Items to return.
    pub limit: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Build parameters from raw query values with the standard cap.
    #[must_use]
    pub fn from_raw(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self::from_raw_capped(offset, limit, DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Build parameters with an explicit default and cap.
    ///
    /// Negative and zero limits fall back to `default_limit`; anything above
    /// `cap` is clamped down to it. Negative offsets become zero.
    #[must_use]
    pub fn from_raw_capped(
        offset: Option<i64>,
        limit: Option<i64>,
        default_limit: usize,
        cap: usize,
    ) -> Self {
        let offset = match offset {
            Some(o) if o > 0 => usize::try_from(o).unwrap_or(usize::MAX),
            _ => 0,
        };
        let limit = match limit {
            Some(l) if l > 0 => usize::try_from(l).unwrap_or(cap).min(cap),
            _ => default_limit,
        };
        Self { offset, limit }
    }

    /// Slice `items` into the requested window, returning the page plus the
    /// pre-slice total.
    #[must_use]
    pub fn slice<T: Clone>(&self, items: &[T]) -> Page<T> {
        let total = items.len();
        let window = items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect();
        Page {
            items: window,
            total,
        }
    }
}

/// One page of a list result with the unsliced total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// The requested window.
    pub items: Vec<T>,
    /// Total matching items before pagination.
    pub total: usize,
}
