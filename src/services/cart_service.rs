use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::record_audit,
    dto::cart::AddToCartRequest,
    entity::{
        CartItems, Carts, Products,
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol},
        carts::{Column as CartCol, Model as CartModel},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{Cart, CartItem, product_from_entity},
    pricing,
    state::AppState,
};

/// Reported when a reservation cannot be made, whatever the reason.
pub const RESERVATION_FAILED: &str = "Process can not be done";

pub async fn get_cart(state: &AppState, request: &RequestContext) -> AppResult<Cart> {
    let buyer = request.authorize(Operation::ManageCart)?;
    load_cart(&state.orm, buyer.user_id).await
}

pub async fn find_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Option<Cart>> {
    let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    hydrate_cart(db, cart).await.map(Some)
}

pub(crate) async fn load_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Cart> {
    find_cart(db, user_id).await?.ok_or(AppError::NotFound("Cart"))
}

/// Row-locks the user's cart so reservations and checkout on it run one at a time.
pub(crate) async fn lock_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<CartModel> {
    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Cart"))
}

async fn hydrate_cart<C: ConnectionTrait>(db: &C, cart: CartModel) -> AppResult<Cart> {
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(CartItemCol::CreatedAt)
        .all(db)
        .await?;

    let items: Vec<CartItem> = rows
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|product| CartItem {
                id: item.id,
                quantity: item.quantity,
                product: product_from_entity(product),
                created_at: item.created_at.with_timezone(&Utc),
            })
        })
        .collect();

    let subtotal =
        pricing::order_total(items.iter().map(|item| (item.product.price, item.quantity)));

    Ok(Cart {
        id: cart.id,
        user_id: cart.user_id,
        items,
        subtotal,
    })
}

/// Takes `quantity` units off an active product. `false` when stock is short or the
/// product is inactive; nothing is written in that case.
pub(crate) async fn reserve_stock<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<bool> {
    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::Stock.gte(quantity))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

pub(crate) async fn release_stock<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(quantity))
        .filter(ProdCol::Id.eq(product_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Empties the user's cart and gives every reserved unit back.
pub(crate) async fn release_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<()> {
    let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(db)
        .await?
    else {
        return Ok(());
    };

    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .all(db)
        .await?;
    for item in &items {
        release_stock(db, item.product_id, item.quantity).await?;
    }
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn add_item(
    state: &AppState,
    request: &RequestContext,
    payload: AddToCartRequest,
) -> AppResult<Cart> {
    let buyer = request.authorize(Operation::ManageCart)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.user_id).await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    if !reserve_stock(&txn, product.id, payload.quantity).await? {
        tracing::debug!(
            product_id = %product.id,
            requested = payload.quantity,
            stock = product.stock,
            active = product.is_active,
            "reservation refused"
        );
        return Err(AppError::BadRequest(RESERVATION_FAILED.to_string()));
    }

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    match existing {
        Some(item) => {
            let quantity = item
                .quantity
                .checked_add(payload.quantity)
                .ok_or_else(|| AppError::BadRequest(RESERVATION_FAILED.to_string()))?;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    let updated = hydrate_cart(&txn, cart).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(buyer.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product.id, "quantity": payload.quantity })),
    )
    .await;

    Ok(updated)
}

pub async fn remove_item(
    state: &AppState,
    request: &RequestContext,
    item_id: Uuid,
) -> AppResult<Cart> {
    let buyer = request.authorize(Operation::ManageCart)?;

    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.user_id).await?;

    let item = CartItems::find()
        .filter(CartItemCol::Id.eq(item_id))
        .filter(CartItemCol::CartId.eq(cart.id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    CartItems::delete_by_id(item.id).exec(&txn).await?;
    release_stock(&txn, item.product_id, item.quantity).await?;

    let updated = hydrate_cart(&txn, cart).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(buyer.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": item.product_id, "quantity": item.quantity })),
    )
    .await;

    Ok(updated)
}
