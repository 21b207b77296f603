use serde::{Deserialize, Serialize};
use validator::Validate;

use super::history::HistoryRecord;

pub(crate) const MAX_PAGE_LIMIT: u32 = 100;

/// Client-side view state. `page` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PaginationModel {
    pub(crate) page: usize,
    pub(crate) page_size: usize,
}

impl PaginationModel {
    pub(crate) fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    pub(crate) fn query(&self) -> HistoryQuery {
        let page = u32::try_from(self.page.saturating_add(1)).unwrap_or(u32::MAX);
        let limit = u32::try_from(self.page_size).unwrap_or(u32::MAX);
        HistoryQuery { page, limit }
    }

    pub(crate) fn page_count(&self, total_rows: u64) -> usize {
        if self.page_size == 0 || total_rows == 0 {
            return 1;
        }
        let pages = total_rows.div_ceil(self.page_size as u64);
        usize::try_from(pages).unwrap_or(usize::MAX)
    }

    pub(crate) fn has_next(&self, total_rows: u64) -> bool {
        self.page + 1 < self.page_count(total_rows)
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.page > 0
    }
}

/// List request parameters. `page` is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Validate)]
pub(crate) struct HistoryQuery {
    #[validate(range(min = 1, message = "page must be positive"))]
    pub(crate) page: u32,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub(crate) limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub(crate) struct PaginationInfo {
    #[serde(default)]
    pub(crate) total: Option<u64>,
}

/// One page of records together with the server's row count.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistoryListing {
    pub(crate) records: Vec<HistoryRecord>,
    pub(crate) total: u64,
}
