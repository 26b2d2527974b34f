use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        Products, WishlistItems,
        wishlist_items::{ActiveModel, Column},
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{WishlistItem, WishlistResponse, wishlist_item_from_entity},
    services::product_service,
    state::AppState,
};

pub async fn list_wishlist(
    state: &AppState,
    request: &RequestContext,
) -> AppResult<Vec<WishlistItem>> {
    let buyer = request.authorize(Operation::ManageWishlist)?;
    let rows = WishlistItems::find()
        .filter(Column::UserId.eq(buyer.user_id))
        .find_also_related(Products)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| wishlist_item_from_entity(item, p)))
        .collect();
    Ok(items)
}

/// Adding a product twice returns the existing entry.
pub async fn add_to_wishlist(
    state: &AppState,
    request: &RequestContext,
    product_id: Uuid,
) -> AppResult<WishlistItem> {
    let buyer = request.authorize(Operation::ManageWishlist)?;
    let product = product_service::find_product(&state.orm, product_id).await?;

    let existing = WishlistItems::find()
        .filter(Column::UserId.eq(buyer.user_id))
        .filter(Column::ProductId.eq(product.id))
        .one(&state.orm)
        .await?;
    if let Some(item) = existing {
        return Ok(wishlist_item_from_entity(item, product));
    }

    let item = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(buyer.user_id),
        product_id: Set(product.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(wishlist_item_from_entity(item, product))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    request: &RequestContext,
    product_id: Uuid,
) -> AppResult<WishlistResponse> {
    let buyer = request.authorize(Operation::ManageWishlist)?;
    let result = WishlistItems::delete_many()
        .filter(Column::UserId.eq(buyer.user_id))
        .filter(Column::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Wishlist item"));
    }
    Ok(WishlistResponse {
        success: true,
        message: Some("Product removed from wishlist".to_string()),
    })
}

pub async fn is_in_wishlist(
    state: &AppState,
    request: &RequestContext,
    product_id: Uuid,
) -> AppResult<bool> {
    let buyer = request.authorize(Operation::ManageWishlist)?;
    let count = WishlistItems::find()
        .filter(Column::UserId.eq(buyer.user_id))
        .filter(Column::ProductId.eq(product_id))
        .count(&state.orm)
        .await?;
    Ok(count > 0)
}
