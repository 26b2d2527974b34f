use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, UpdateOrderStatusRequest},
    entity::enums::{OrderStatus, PaymentMethod},
    graphql::{IntoGql, request_parts},
    models::{Order, OrderTracking},
    services::order_service,
};

#[derive(Default)]
pub struct OrderQuery;

#[Object(rename_args = "snake_case")]
impl OrderQuery {
    async fn order_history(&self, ctx: &Context<'_>) -> Result<Vec<Order>> {
        let (state, request) = request_parts(ctx)?;
        order_service::order_history(state, request).await.into_gql()
    }

    async fn get_orders(&self, ctx: &Context<'_>, order_status: OrderStatus) -> Result<Vec<Order>> {
        let (state, request) = request_parts(ctx)?;
        order_service::orders_by_status(state, request, order_status)
            .await
            .into_gql()
    }

    async fn get_order(&self, ctx: &Context<'_>, order_id: Uuid) -> Result<Order> {
        let (state, request) = request_parts(ctx)?;
        order_service::get_order(state, request, order_id)
            .await
            .into_gql()
    }

    async fn track_order(&self, ctx: &Context<'_>, order_id: Uuid) -> Result<OrderTracking> {
        let (state, request) = request_parts(ctx)?;
        order_service::track_order(state, request, order_id)
            .await
            .into_gql()
    }
}

#[derive(Default)]
pub struct OrderMutation;

#[Object(rename_args = "snake_case")]
impl OrderMutation {
    /// Turns the caller's cart into an order with a pending payment.
    async fn process_order(
        &self,
        ctx: &Context<'_>,
        payment_method: PaymentMethod,
        address_id: Uuid,
    ) -> Result<Order> {
        let (state, request) = request_parts(ctx)?;
        let payload = CheckoutRequest {
            payment_method,
            address_id,
        };
        order_service::process_order(state, request, payload)
            .await
            .into_gql()
    }

    async fn update_order_status(
        &self,
        ctx: &Context<'_>,
        order_id: Uuid,
        order_status: OrderStatus,
    ) -> Result<Order> {
        let (state, request) = request_parts(ctx)?;
        let payload = UpdateOrderStatusRequest {
            order_id,
            status: order_status,
        };
        order_service::update_order_status(state, request, payload)
            .await
            .into_gql()
    }
}
