use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::orders::{CheckoutRequest, UpdateOrderStatusRequest},
    entity::{
        Addresses, CartItems, OrderItems, Orders, Payments, Products,
        addresses::{Column as AddrCol, Model as AddressModel},
        cart_items::Column as CartItemCol,
        enums::{OrderStatus, PaymentStatus, Role},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PayCol, Model as PaymentModel},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, RequestContext},
        policy::Operation,
    },
    models::{
        Order, OrderItem, OrderTracking, Payment, order_from_entity, payment_from_entity,
        product_from_entity,
    },
    pricing,
    services::cart_service,
    state::AppState,
    tracking,
};

/// One cart line as priced inside the checkout transaction.
struct CheckoutLine {
    cart_item_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
}

pub async fn process_order(
    state: &AppState,
    request: &RequestContext,
    payload: CheckoutRequest,
) -> AppResult<Order> {
    let buyer = request.authorize(Operation::PlaceOrder)?;
    let txn = state.orm.begin().await?;

    let cart = cart_service::lock_cart(&txn, buyer.user_id).await?;
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .all(&txn)
        .await?;
    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut lines = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let product = product.ok_or(AppError::NotFound("Product"))?;
        lines.push(CheckoutLine {
            cart_item_id: item.id,
            product_id: product.id,
            quantity: item.quantity,
            unit_price: product.price,
        });
    }
    let total_amount = pricing::order_total(lines.iter().map(|l| (l.unit_price, l.quantity)));

    let address = Addresses::find()
        .filter(AddrCol::Id.eq(payload.address_id))
        .filter(AddrCol::UserId.eq(buyer.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Address"))?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(buyer.user_id),
        address_id: Set(address.id),
        status: Set(OrderStatus::Pending),
        total_amount: Set(total_amount),
        order_date: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let cart_item_ids: Vec<Uuid> = lines.iter().map(|l| l.cart_item_id).collect();
    CartItems::delete_many()
        .filter(CartItemCol::Id.is_in(cart_item_ids))
        .exec(&txn)
        .await?;

    let order_items = lines.iter().map(|line| OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        product_id: Set(line.product_id),
        quantity: Set(line.quantity),
        price_at_purchase: Set(line.unit_price),
    });
    OrderItems::insert_many(order_items).exec(&txn).await?;

    PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        user_id: Set(buyer.user_id),
        payment_method: Set(payload.payment_method),
        payment_status: Set(PaymentStatus::Pending),
        transaction_id: Set(build_transaction_id(order.id)),
        amount: Set(total_amount),
        paid_at: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let placed = hydrate_one(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %placed.id,
        user_id = %buyer.user_id,
        total = %placed.total_amount,
        items = placed.items.len(),
        "order placed"
    );
    record_audit(
        &state.pool,
        Some(buyer.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": placed.id, "total_amount": placed.total_amount })),
    )
    .await;

    Ok(placed)
}

fn build_transaction_id(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    format!("TXN-{}-{}", date, &suffix[..12])
}

/// Attaches address, payment and priced items to each order in four queries.
pub(crate) async fn hydrate_orders<C: ConnectionTrait>(
    db: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut address_ids: Vec<Uuid> = orders.iter().map(|o| o.address_id).collect();
    address_ids.sort_unstable();
    address_ids.dedup();

    let addresses: HashMap<Uuid, AddressModel> = Addresses::find()
        .filter(AddrCol::Id.is_in(address_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let mut payments: HashMap<Uuid, PaymentModel> = Payments::find()
        .filter(PayCol::OrderId.is_in(order_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.order_id, p))
        .collect();

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .find_also_related(Products)
        .all(db)
        .await?;
    for (item, product) in rows {
        let Some(product) = product else { continue };
        items.entry(item.order_id).or_default().push(OrderItem {
            id: item.id,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            product: product_from_entity(product),
        });
    }

    let mut hydrated = Vec::with_capacity(orders.len());
    for order in orders {
        let address = addresses.get(&order.address_id).cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("order {} has no address", order.id))
        })?;
        let payment = payments.remove(&order.id);
        let order_items = items.remove(&order.id).unwrap_or_default();
        hydrated.push(order_from_entity(order, address, payment, order_items));
    }
    Ok(hydrated)
}

async fn hydrate_one<C: ConnectionTrait>(db: &C, order: OrderModel) -> AppResult<Order> {
    hydrate_orders(db, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order vanished while loading")))
}

pub async fn list_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<Order>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_desc(OrderCol::OrderDate)
        .all(db)
        .await?;
    hydrate_orders(db, orders).await
}

pub async fn payments_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Vec<Payment>> {
    let items = Payments::find()
        .filter(PayCol::UserId.eq(user_id))
        .order_by_desc(PayCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(payment_from_entity)
        .collect();
    Ok(items)
}

pub async fn order_history(state: &AppState, request: &RequestContext) -> AppResult<Vec<Order>> {
    let buyer = request.authorize(Operation::ViewOrders)?;
    list_for_user(&state.orm, buyer.user_id).await
}

/// Buyers see their own orders, admins see everyone's.
pub async fn orders_by_status(
    state: &AppState,
    request: &RequestContext,
    status: OrderStatus,
) -> AppResult<Vec<Order>> {
    let caller = request.authorize(Operation::ViewOrders)?;

    let mut condition = Condition::all().add(OrderCol::Status.eq(status));
    if caller.role != Role::Admin {
        condition = condition.add(OrderCol::UserId.eq(caller.user_id));
    }

    let orders = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::OrderDate)
        .all(&state.orm)
        .await?;
    hydrate_orders(&state.orm, orders).await
}

/// Orders that are not the caller's read as missing unless the caller is an admin.
async fn visible_order<C: ConnectionTrait>(
    db: &C,
    caller: &AuthUser,
    order_id: Uuid,
) -> AppResult<OrderModel> {
    let mut finder = Orders::find().filter(OrderCol::Id.eq(order_id));
    if caller.role != Role::Admin {
        finder = finder.filter(OrderCol::UserId.eq(caller.user_id));
    }
    finder.one(db).await?.ok_or(AppError::NotFound("Order"))
}

pub async fn get_order(
    state: &AppState,
    request: &RequestContext,
    order_id: Uuid,
) -> AppResult<Order> {
    let caller = request.authorize(Operation::ViewOrders)?;
    let order = visible_order(&state.orm, caller, order_id).await?;
    hydrate_one(&state.orm, order).await
}

pub async fn track_order(
    state: &AppState,
    request: &RequestContext,
    order_id: Uuid,
) -> AppResult<OrderTracking> {
    let caller = request.authorize(Operation::TrackOrder)?;
    let order = visible_order(&state.orm, caller, order_id).await?;
    let tracking = tracking::project(order.status, order.order_date.with_timezone(&Utc));
    let order = hydrate_one(&state.orm, order).await?;
    Ok(OrderTracking { order, tracking })
}

pub async fn update_order_status(
    state: &AppState,
    request: &RequestContext,
    payload: UpdateOrderStatusRequest,
) -> AppResult<Order> {
    let caller = request.authorize(Operation::UpdateOrderStatus)?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let is_admin = caller.role == Role::Admin;
    if !is_admin && order.user_id != caller.user_id {
        return Err(AppError::Forbidden);
    }
    let previous = order.status;
    if !previous.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {} to {}",
            previous.as_str(),
            next.as_str()
        )));
    }
    if !is_admin && !previous.buyer_may_request(next) {
        return Err(AppError::Forbidden);
    }

    if next.releases_stock() {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .all(&txn)
            .await?;
        for item in &items {
            cart_service::release_stock(&txn, item.product_id, item.quantity).await?;
        }
    }

    let payment = Payments::find()
        .filter(PayCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;
    if let Some(payment) = payment {
        if let Some(status) = payment.payment_status.after_order_status(next) {
            let mut active: PaymentActive = payment.into();
            active.payment_status = Set(status);
            if status == PaymentStatus::Success {
                active.paid_at = Set(Some(Utc::now().into()));
            }
            active.update(&txn).await?;
        }
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let updated = hydrate_one(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %updated.id,
        from = previous.as_str(),
        to = next.as_str(),
        by = %caller.user_id,
        "order status changed"
    );
    record_audit(
        &state.pool,
        Some(caller.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": updated.id,
            "from": previous.as_str(),
            "to": next.as_str(),
        })),
    )
    .await;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_is_dated_and_derived_from_order() {
        let order_id = Uuid::new_v4();
        let id = build_transaction_id(order_id);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TXN");
        assert_eq!(parts[1].len(), 8);
        assert!(order_id.simple().to_string().starts_with(parts[2]));
    }
}
