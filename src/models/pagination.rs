//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    /// 页码从 1 开始；每页数量限制在 1..=100
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: per_page
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn get_offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    pub fn get_limit(&self) -> u64 {
        self.page_size
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: PaginationParams, total: u64) -> Self {
        let total_pages = total.div_ceil(params.page_size);
        Self {
            data,
            page: params.page,
            page_size: params.page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let p = PaginationParams::new(None, None);
        assert_eq!((p.page, p.page_size), (1, 20));

        let p = PaginationParams::new(Some(0), Some(1000));
        assert_eq!((p.page, p.page_size), (1, 100));

        let p = PaginationParams::new(Some(3), Some(0));
        assert_eq!((p.page, p.page_size), (3, 1));
    }

    #[test]
    fn test_offset() {
        let p = PaginationParams::new(Some(3), Some(10));
        assert_eq!(p.get_offset(), 20);
        assert_eq!(p.get_limit(), 10);
    }

    #[test]
    fn test_total_pages() {
        let p = PaginationParams::new(Some(1), Some(20));
        assert_eq!(PaginatedResponse::new(Vec::<i32>::new(), p, 0).total_pages, 0);
        assert_eq!(PaginatedResponse::new(Vec::<i32>::new(), p, 20).total_pages, 1);
        assert_eq!(PaginatedResponse::new(Vec::<i32>::new(), p, 21).total_pages, 2);
    }
}
