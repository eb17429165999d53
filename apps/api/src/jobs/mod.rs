// Jobs: feed, swipe actions on the candidate inbox, and recruiter postings.

pub mod actions;
pub mod feed;
pub mod handlers;
pub mod postings;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// `?page&limit` query parameters. Pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageParams {
    /// Non-positive or missing values fall back to page 1 / the default size;
    /// `limit` is capped at `max_limit`.
    pub fn resolve(self, max_limit: usize) -> PageRequest {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(1) as usize;
        let limit = self
            .limit
            .filter(|l| *l >= 1)
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(max_limit.max(1));
        PageRequest { page, limit }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_jobs: usize,
    pub has_more: bool,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Returns the slice of `items` for this page plus the pagination envelope.
    pub fn slice<T>(&self, items: Vec<T>) -> (Vec<T>, Pagination) {
        let total = items.len();
        let page_items: Vec<T> = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit)
            .collect();
        let total_pages = total.div_ceil(self.limit);
        let pagination = Pagination {
            current_page: self.page,
            total_pages,
            total_jobs: total,
            has_more: self.page < total_pages,
        };
        (page_items, pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_and_caps() {
        let p = PageParams::default().resolve(50);
        assert_eq!(p, PageRequest { page: 1, limit: 20 });

        let p = PageParams {
            page: Some(0),
            limit: Some(500),
        }
        .resolve(50);
        assert_eq!(p, PageRequest { page: 1, limit: 50 });

        let p = PageParams {
            page: Some(-3),
            limit: Some(-1),
        }
        .resolve(50);
        assert_eq!(p, PageRequest { page: 1, limit: 20 });
    }

    #[test]
    fn test_slice_pages() {
        let req = PageRequest { page: 2, limit: 5 };
        let (items, pagination) = req.slice((0..12).collect::<Vec<_>>());
        assert_eq!(items, vec![5, 6, 7, 8, 9]);
        assert_eq!(
            pagination,
            Pagination {
                current_page: 2,
                total_pages: 3,
                total_jobs: 12,
                has_more: true
            }
        );

        let (items, pagination) = PageRequest { page: 4, limit: 5 }.slice((0..12).collect::<Vec<_>>());
        assert!(items.is_empty());
        assert!(!pagination.has_more);
    }

    #[test]
    fn test_slice_empty() {
        let (items, pagination) = PageRequest { page: 1, limit: 5 }.slice(Vec::<u8>::new());
        assert!(items.is_empty());
        assert_eq!(pagination.total_pages, 0);
        assert!(!pagination.has_more);
    }
}
