use async_graphql::InputObject;
use validator::Validate;

use crate::dto::validators::validate_phone;

#[derive(Debug, Clone, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
pub struct AddressInput {
    #[validate(length(min = 2, max = 100, message = "full name must be between 2 and 100 characters"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "country is required"))]
    pub country: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub is_default: Option<bool>,
}
