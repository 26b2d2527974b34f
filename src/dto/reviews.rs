use async_graphql::InputObject;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
pub struct ReviewInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 1000, message = "comment must be between 1 and 1000 characters"))]
    pub comment: String,
}

#[derive(Debug, Default, InputObject, Validate)]
#[graphql(rename_fields = "snake_case")]
pub struct ReviewPatch {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(min = 1, max = 1000, message = "comment must be between 1 and 1000 characters"))]
    pub comment: Option<String>,
}
