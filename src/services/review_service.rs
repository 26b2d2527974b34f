use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::record_audit,
    dto::reviews::{ReviewInput, ReviewPatch},
    entity::{
        Reviews,
        reviews::{ActiveModel, Column, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{Review, review_from_entity},
    services::product_service,
    state::AppState,
};

pub async fn list_for_product<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
) -> AppResult<Vec<Review>> {
    let items = Reviews::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::ReviewDate)
        .all(db)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();
    Ok(items)
}

pub async fn list_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<Review>> {
    let items = Reviews::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::ReviewDate)
        .all(db)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();
    Ok(items)
}

pub async fn product_reviews(
    state: &AppState,
    request: &RequestContext,
    product_id: Uuid,
) -> AppResult<Vec<Review>> {
    request.authorize(Operation::ViewCatalog)?;
    product_service::find_product(&state.orm, product_id).await?;
    list_for_product(&state.orm, product_id).await
}

async fn authored<C: ConnectionTrait>(db: &C, user_id: Uuid, id: Uuid) -> AppResult<ReviewModel> {
    Reviews::find()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Review"))
}

pub async fn add_review(
    state: &AppState,
    request: &RequestContext,
    payload: ReviewInput,
) -> AppResult<Review> {
    let buyer = request.authorize(Operation::ManageReviews)?;
    payload.validate()?;
    let product = product_service::find_product(&state.orm, payload.product_id).await?;

    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(buyer.user_id),
        product_id: Set(product.id),
        rating: Set(payload.rating),
        comment: Set(payload.comment.trim().to_string()),
        review_date: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.pool,
        Some(buyer.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "product_id": product.id })),
    )
    .await;

    Ok(review_from_entity(review))
}

pub async fn update_review(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
    payload: ReviewPatch,
) -> AppResult<Review> {
    let buyer = request.authorize(Operation::ManageReviews)?;
    payload.validate()?;

    let mut active: ActiveModel = authored(&state.orm, buyer.user_id, id).await?.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment.trim().to_string());
    }
    active.review_date = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;
    Ok(review_from_entity(review))
}

pub async fn delete_review(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
) -> AppResult<String> {
    let buyer = request.authorize(Operation::ManageReviews)?;
    let review = authored(&state.orm, buyer.user_id, id).await?;
    Reviews::delete_by_id(review.id).exec(&state.orm).await?;
    Ok("Review deleted".to_string())
}
