use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::record_audit,
    dto::{
        auth::{EmailUpdate, NameUpdate, PasswordChange, PhoneUpdate},
        validators::normalize_phone,
    },
    entity::{
        Orders, Products, Users, orders::Column as OrderCol, products::Column as ProdCol,
        users::{ActiveModel as UserActive, Column as UserCol, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{User, user_from_entity},
    services::{auth_service, cart_service},
    state::AppState,
};

pub async fn find_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<User> {
    load_user(db, user_id).await.map(user_from_entity)
}

async fn load_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("User"))
}

pub async fn current_user(state: &AppState, request: &RequestContext) -> AppResult<User> {
    let caller = request.authorize(Operation::ManageAccount)?;
    find_user(&state.orm, caller.user_id).await
}

pub async fn update_name(
    state: &AppState,
    request: &RequestContext,
    payload: NameUpdate,
) -> AppResult<User> {
    let caller = request.authorize(Operation::ManageAccount)?;
    payload.validate()?;

    let mut active: UserActive = load_user(&state.orm, caller.user_id).await?.into();
    active.name = Set(payload.name.trim().to_string());
    let user = active.update(&state.orm).await?;
    Ok(user_from_entity(user))
}

pub async fn update_email(
    state: &AppState,
    request: &RequestContext,
    payload: EmailUpdate,
) -> AppResult<User> {
    let caller = request.authorize(Operation::ManageAccount)?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let taken = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .filter(UserCol::Id.ne(caller.user_id))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let mut active: UserActive = load_user(&state.orm, caller.user_id).await?.into();
    active.email = Set(email);
    let user = active.update(&state.orm).await?;
    record_audit(
        &state.pool,
        Some(user.id),
        "user_email_update",
        Some("users"),
        None,
    )
    .await;
    Ok(user_from_entity(user))
}

pub async fn update_phone(
    state: &AppState,
    request: &RequestContext,
    payload: PhoneUpdate,
) -> AppResult<User> {
    let caller = request.authorize(Operation::ManageAccount)?;
    payload.validate()?;

    let mut active: UserActive = load_user(&state.orm, caller.user_id).await?.into();
    active.phone = Set(Some(normalize_phone(&payload.phone)));
    let user = active.update(&state.orm).await?;
    Ok(user_from_entity(user))
}

pub async fn update_password(
    state: &AppState,
    request: &RequestContext,
    payload: PasswordChange,
) -> AppResult<User> {
    let caller = request.authorize(Operation::ManageAccount)?;
    payload.validate()?;

    let user = load_user(&state.orm, caller.user_id).await?;
    if !auth_service::verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is not correct".to_string(),
        ));
    }

    let mut active: UserActive = user.into();
    active.password_hash = Set(auth_service::hash_password(&payload.new_password)?);
    let user = active.update(&state.orm).await?;
    record_audit(
        &state.pool,
        Some(user.id),
        "user_password_update",
        Some("users"),
        None,
    )
    .await;
    Ok(user_from_entity(user))
}

/// Removes the caller's account. Accounts with order history or listed products are kept.
pub async fn delete_user(state: &AppState, request: &RequestContext) -> AppResult<User> {
    let caller = request.authorize(Operation::ManageAccount)?;

    let txn = state.orm.begin().await?;
    let user = load_user(&txn, caller.user_id).await?;

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.id))
        .count(&txn)
        .await?;
    if orders > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete an account with order history".to_string(),
        ));
    }

    let products = Products::find()
        .filter(ProdCol::SellerId.eq(user.id))
        .count(&txn)
        .await?;
    if products > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete an account that still has products".to_string(),
        ));
    }

    cart_service::release_cart(&txn, user.id).await?;
    Users::delete_by_id(user.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, "account deleted");
    record_audit(
        &state.pool,
        None,
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(user_from_entity(user))
}
