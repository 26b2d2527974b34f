use uuid::Uuid;

use crate::entity::enums::{OrderStatus, PaymentMethod};

#[derive(Debug)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub address_id: Uuid,
}

#[derive(Debug)]
pub struct UpdateOrderStatusRequest {
    pub order_id: Uuid,
    pub status: OrderStatus,
}
