use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::{
    dto::cart::AddToCartRequest,
    graphql::{IntoGql, request_parts},
    models::Cart,
    services::cart_service,
};

#[derive(Default)]
pub struct CartQuery;

#[Object(rename_args = "snake_case")]
impl CartQuery {
    async fn cart(&self, ctx: &Context<'_>) -> Result<Cart> {
        let (state, request) = request_parts(ctx)?;
        cart_service::get_cart(state, request).await.into_gql()
    }
}

#[derive(Default)]
pub struct CartMutation;

#[Object(rename_args = "snake_case")]
impl CartMutation {
    /// Reserves stock for the product and adds it to the caller's cart.
    async fn add_to_cart(
        &self,
        ctx: &Context<'_>,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Cart> {
        let (state, request) = request_parts(ctx)?;
        let payload = AddToCartRequest {
            product_id,
            quantity,
        };
        cart_service::add_item(state, request, payload)
            .await
            .into_gql()
    }

    async fn remove_from_cart(&self, ctx: &Context<'_>, item_id: Uuid) -> Result<Cart> {
        let (state, request) = request_parts(ctx)?;
        cart_service::remove_item(state, request, item_id)
            .await
            .into_gql()
    }
}
