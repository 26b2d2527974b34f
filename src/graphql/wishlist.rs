use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::{
    graphql::{IntoGql, request_parts},
    models::{WishlistItem, WishlistResponse},
    services::wishlist_service,
};

#[derive(Default)]
pub struct WishlistQuery;

#[Object(rename_args = "snake_case")]
impl WishlistQuery {
    async fn get_user_wishlist(&self, ctx: &Context<'_>) -> Result<Vec<WishlistItem>> {
        let (state, request) = request_parts(ctx)?;
        wishlist_service::list_wishlist(state, request)
            .await
            .into_gql()
    }

    async fn is_in_wishlist(&self, ctx: &Context<'_>, product_id: Uuid) -> Result<bool> {
        let (state, request) = request_parts(ctx)?;
        wishlist_service::is_in_wishlist(state, request, product_id)
            .await
            .into_gql()
    }
}

#[derive(Default)]
pub struct WishlistMutation;

#[Object(rename_args = "snake_case")]
impl WishlistMutation {
    async fn add_to_wishlist(&self, ctx: &Context<'_>, product_id: Uuid) -> Result<WishlistItem> {
        let (state, request) = request_parts(ctx)?;
        wishlist_service::add_to_wishlist(state, request, product_id)
            .await
            .into_gql()
    }

    async fn remove_from_wishlist(
        &self,
        ctx: &Context<'_>,
        product_id: Uuid,
    ) -> Result<WishlistResponse> {
        let (state, request) = request_parts(ctx)?;
        wishlist_service::remove_from_wishlist(state, request, product_id)
            .await
            .into_gql()
    }
}
