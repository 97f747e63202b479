//! Pagination: `LIMIT`/`OFFSET` from a 1-based page number.

use serde::Serialize;

use super::QueryContext;

/// Upper bound on `page_size` when the caller does not set one.
pub const DEFAULT_PAGE_MAX: u64 = 10_000;

/// The page actually served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
}

impl PageInfo {
    /// Resolve requested values: the page is at least 1 and the size is
    /// clamped to `page_max`, defaulting to it.
    pub fn resolve(page: Option<u64>, page_size: Option<u64>, page_max: u64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(page_max).min(page_max),
        }
    }

    /// Rows skipped before this page, capped at the largest offset SQL
    /// integers can express.
    pub fn offset(&self) -> u64 {
        const MAX_OFFSET: u64 = i64::MAX as u64;
        (self.page - 1)
            .checked_mul(self.page_size)
            .map_or(MAX_OFFSET, |offset| offset.min(MAX_OFFSET))
    }
}

/// Limit `ctx` to one page. A zero page size still sets `LIMIT 0`; callers
/// skip the data query in that case.
pub fn paginate(
    ctx: QueryContext,
    page: Option<u64>,
    page_size: Option<u64>,
    page_max: u64,
) -> (QueryContext, PageInfo) {
    let info = PageInfo::resolve(page, page_size, page_max);
    let offset = info.offset();
    let ctx = ctx.map_query(|q| {
        let q = q.limit(info.page_size);
        if offset > 0 {
            q.offset(offset)
        } else {
            q
        }
    });
    (ctx, info)
}
