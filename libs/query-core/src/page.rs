use serde::{Deserialize, Serialize};

use crate::directive::DirectiveSet;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Largest offset a store accepts; SQL offsets are signed 64-bit.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default: u64,
    pub max: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            max: MAX_PAGE_SIZE,
        }
    }
}

/// Requested size, or the default, kept within `1..=max`.
pub fn clamp_page_size(req: Option<u64>, limits: PageLimits) -> u64 {
    let mut size = req.unwrap_or(limits.default);
    if size == 0 {
        size = 1;
    }
    if size > limits.max {
        size = limits.max.max(1);
    }
    size
}

/// `ceil(total / page_size)`, never below 1.
pub fn page_count(total_size: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    total_size.div_ceil(page_size).max(1)
}

/// Effective paging for one query, resolved from a directive set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
    pub distinct: bool,
}

impl PageRequest {
    pub fn new(page_number: u64, page_size: u64) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
            distinct: false,
        }
    }

    pub fn from_directives(directives: &DirectiveSet, limits: PageLimits) -> Self {
        let paging = directives.paging().copied().unwrap_or_default();
        Self {
            page_number: paging.page_number.unwrap_or(1).max(1),
            page_size: clamp_page_size(paging.page_size, limits),
            distinct: paging.distinct,
        }
    }

    /// Zero-based offset of the first row on this page, capped at
    /// [`MAX_OFFSET`].
    pub fn offset(&self) -> u64 {
        self.page_number
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(MAX_OFFSET)
    }

    pub fn page_info(&self, total_size: u64) -> PageInfo {
        PageInfo {
            total_size,
            page_size: self.page_size,
            page_number: self.page_number,
            page_count: page_count(total_size, self.page_size),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub total_size: u64,
    pub page_size: u64,
    pub page_number: u64,
    pub page_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    /// Create a new page with items and page info
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Map items while preserving page_info (record -> DTO mapping convenience)
    pub fn map_items<U>(self, mut f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(&mut f).collect(),
            page_info: self.page_info,
        }
    }
}
