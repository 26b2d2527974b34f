use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::{
    dto::reviews::{ReviewInput, ReviewPatch},
    graphql::{IntoGql, request_parts},
    models::Review,
    services::review_service,
};

#[derive(Default)]
pub struct ReviewQuery;

#[Object(rename_args = "snake_case")]
impl ReviewQuery {
    async fn get_reviews(&self, ctx: &Context<'_>, product_id: Uuid) -> Result<Vec<Review>> {
        let (state, request) = request_parts(ctx)?;
        review_service::product_reviews(state, request, product_id)
            .await
            .into_gql()
    }
}

#[derive(Default)]
pub struct ReviewMutation;

#[Object(rename_args = "snake_case")]
impl ReviewMutation {
    async fn add_review(&self, ctx: &Context<'_>, data: ReviewInput) -> Result<Review> {
        let (state, request) = request_parts(ctx)?;
        review_service::add_review(state, request, data)
            .await
            .into_gql()
    }

    async fn update_review(
        &self,
        ctx: &Context<'_>,
        review_id: Uuid,
        data: ReviewPatch,
    ) -> Result<Review> {
        let (state, request) = request_parts(ctx)?;
        review_service::update_review(state, request, review_id, data)
            .await
            .into_gql()
    }

    async fn delete_review(&self, ctx: &Context<'_>, review_id: Uuid) -> Result<String> {
        let (state, request) = request_parts(ctx)?;
        review_service::delete_review(state, request, review_id)
            .await
            .into_gql()
    }
}
