//! Shared data models for Loanbook backend

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

pub mod auth;
pub use auth::*;

use crate::debt::calculator::MONEY_SCALE;

/// Largest magnitude a NUMERIC(12, 2) column holds
const MONEY_LIMIT: Decimal = dec!(10000000000);

/// Request-shape check for money and rate fields: at most two fractional
/// digits and ten integer digits. Sign is left to the domain rules.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MONEY_SCALE {
        let mut err = ValidationError::new("max_decimal_places");
        err.message = Some("at most 2 decimal places are allowed".into());
        return Err(err);
    }
    if value.abs() >= MONEY_LIMIT {
        let mut err = ValidationError::new("max_digits");
        err.message = Some("at most 10 integer digits are allowed".into());
        return Err(err);
    }
    Ok(())
}

/// Pagination parameters
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Server-side pagination limits
#[derive(Debug, Clone, Copy)]
pub struct PaginationSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// A resolved, bounded page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn resolve(params: &PaginationParams, settings: &PaginationSettings) -> Self {
        let page_size = params
            .page_size
            .unwrap_or(settings.default_page_size)
            .clamp(1, settings.max_page_size.max(1));

        Self {
            page: params.page.unwrap_or(1).max(1),
            page_size,
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Navigation links for a page
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Paginated response
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub links: PageLinks,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, request: PageRequest, path: &str) -> Self {
        let link = |page: u32| format!("{}?page={}&page_size={}", path, page, request.page_size);

        let seen = i64::from(request.page) * i64::from(request.page_size);
        let next = (seen < count).then(|| link(request.page + 1));
        let previous = (request.page > 1).then(|| link(request.page - 1));

        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            links: PageLinks { next, previous },
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: PaginationSettings = PaginationSettings {
        default_page_size: 10,
        max_page_size: 100,
    };

    #[test]
    fn test_page_request_defaults_and_bounds() {
        let req = PageRequest::resolve(&PaginationParams::default(), &SETTINGS);
        assert_eq!(req, PageRequest { page: 1, page_size: 10 });
        assert_eq!(req.offset(), 0);

        let req = PageRequest::resolve(
            &PaginationParams {
                page: Some(0),
                page_size: Some(500),
            },
            &SETTINGS,
        );
        assert_eq!(req, PageRequest { page: 1, page_size: 100 });

        let req = PageRequest::resolve(
            &PaginationParams {
                page: Some(3),
                page_size: Some(20),
            },
            &SETTINGS,
        );
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn test_page_links() {
        let req = PageRequest { page: 2, page_size: 10 };
        let page = Page::new(vec![1, 2, 3], 25, req, "/api/loans");
        assert_eq!(
            page.links.next.as_deref(),
            Some("/api/loans?page=3&page_size=10")
        );
        assert_eq!(
            page.links.previous.as_deref(),
            Some("/api/loans?page=1&page_size=10")
        );

        let last = Page::new(vec![1], 21, PageRequest { page: 3, page_size: 10 }, "/api/loans");
        assert!(last.links.next.is_none());
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::new(vec![], 0, PageRequest { page: 1, page_size: 10 }, "/x");
        assert_eq!(page.count, 0);
        assert_eq!(page.links, PageLinks { next: None, previous: None });
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money(&dec!(100000.00)).is_ok());
        assert!(validate_money(&dec!(1.8)).is_ok());
        assert!(validate_money(&dec!(-2.50)).is_ok());
        assert_eq!(
            validate_money(&dec!(10.005)).unwrap_err().code,
            "max_decimal_places"
        );
        assert_eq!(
            validate_money(&dec!(12345678901)).unwrap_err().code,
            "max_digits"
        );
    }
}
