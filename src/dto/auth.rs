use async_graphql::InputObject;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{dto::validators::validate_phone, entity::enums::Role};

#[derive(Debug, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
pub struct SignupInput {
    #[validate(length(min = 6, max = 50, message = "name must be between 6 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, max = 50, message = "password must be between 6 and 50 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub confirm_password: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub role: Role,
}

#[derive(Debug, InputObject, Validate)]
pub struct LoginInput {
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Validate)]
pub struct NameUpdate {
    #[validate(length(min = 6, max = 50, message = "name must be between 6 and 50 characters"))]
    pub name: String,
}

#[derive(Debug, Validate)]
pub struct EmailUpdate {
    #[validate(email(message = "email is invalid"))]
    pub email: String,
}

#[derive(Debug, Validate)]
pub struct PhoneUpdate {
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

#[derive(Debug, Validate)]
pub struct PasswordChange {
    pub current_password: String,
    #[validate(length(min = 6, max = 50, message = "password must be between 6 and 50 characters"))]
    pub new_password: String,
}

/// JWT payload. `timestamp` is the issue time in milliseconds.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub timestamp: i64,
    pub exp: usize,
}
