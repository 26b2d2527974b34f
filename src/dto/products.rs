use async_graphql::{Enum, InputObject};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dto::validators::{validate_discount, validate_price};

#[derive(Debug, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
pub struct ProductInput {
    #[validate(length(min = 10, max = 75, message = "title must be between 10 and 75 characters"))]
    pub title: String,
    #[validate(length(min = 20, message = "description must be at least 20 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(custom(function = "validate_discount"))]
    pub discount: Option<Decimal>,
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: i32,
    #[validate(length(min = 1, max = 100, message = "brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, message = "category name is required"))]
    pub category_name: String,
}

/// Partial product update; absent fields are left untouched.
#[derive(Debug, Default, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
pub struct ProductPatch {
    #[validate(length(min = 10, max = 75, message = "title must be between 10 and 75 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 20, message = "description must be at least 20 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(custom(function = "validate_discount"))]
    pub discount: Option<Decimal>,
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "brand is required"))]
    pub brand: Option<String>,
    #[validate(length(min = 1, message = "category name is required"))]
    pub category_name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Enum)]
pub enum ProductSortBy {
    #[default]
    CreatedAt,
    Price,
    Title,
    Stock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Enum)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

pub const DEFAULT_PAGE_SIZE: u64 = 12;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Default, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
#[validate(schema(function = "validate_price_range"))]
pub struct SearchFilters {
    #[validate(length(max = 100, message = "query is too long"))]
    pub query: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub min_price: Option<Decimal>,
    #[validate(custom(function = "validate_price"))]
    pub max_price: Option<Decimal>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchFilters {
    /// `(page, limit, offset)` with page >= 1 and limit clamped to `1..=100`.
    /// The offset saturates at `i64::MAX`, the largest OFFSET Postgres accepts.
    pub fn normalize(&self) -> (u64, u64, u64) {
        let page = self.page.unwrap_or(1).max(1) as u64;
        let limit = self
            .limit
            .map(|l| l.clamp(1, MAX_PAGE_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit).min(i64::MAX as u64);
        (page, limit, offset)
    }
}

fn validate_price_range(filters: &SearchFilters) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            let mut err = ValidationError::new("price_range");
            err.message = Some("min_price must not exceed max_price".into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Validate)]
pub struct CategoryName {
    #[validate(length(min = 2, max = 50, message = "category must be between 2 and 50 characters"))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductInput {
        ProductInput {
            title: "Trail running shoes".into(),
            description: "Lightweight shoes with a grippy outsole.".into(),
            price: Decimal::new(8999, 2),
            discount: Some(Decimal::new(10, 0)),
            stock: 5,
            brand: "Stride".into(),
            category_name: "Footwear".into(),
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(product().validate().is_ok());
    }

    #[test]
    fn short_title_is_rejected() {
        let input = ProductInput {
            title: "Shoes".into(),
            ..product()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let input = ProductInput {
            stock: -1,
            ..product()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_patch_is_valid() {
        assert!(ProductPatch::default().validate().is_ok());
    }

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(SearchFilters::default().normalize(), (1, 12, 0));

        let filters = SearchFilters {
            page: Some(3),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(filters.normalize(), (3, 100, 200));

        let filters = SearchFilters {
            page: Some(-4),
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filters.normalize(), (1, 1, 0));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let filters = SearchFilters {
            page: Some(i64::MAX),
            limit: Some(100),
            ..Default::default()
        };
        let (page, limit, offset) = filters.normalize();
        assert_eq!(page, i64::MAX as u64);
        assert_eq!(limit, 100);
        assert_eq!(offset, i64::MAX as u64);
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let filters = SearchFilters {
            min_price: Some(Decimal::new(50, 0)),
            max_price: Some(Decimal::new(10, 0)),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
    }
}
