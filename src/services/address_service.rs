use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{addresses::AddressInput, validators::normalize_phone},
    entity::{
        Addresses, Orders,
        addresses::{ActiveModel, Column, Model as AddressModel},
        orders::Column as OrderCol,
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{Address, address_from_entity},
    state::AppState,
};

pub async fn list_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<Address>> {
    let items = Addresses::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::IsDefault)
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect();
    Ok(items)
}

/// Another user's address reads as missing.
async fn owned_address<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    id: Uuid,
    lock: bool,
) -> AppResult<AddressModel> {
    let mut finder = Addresses::find()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id));
    if lock {
        finder = finder.lock(LockType::Update);
    }
    finder.one(db).await?.ok_or(AppError::NotFound("Address"))
}

async fn clear_default<C: ConnectionTrait>(db: &C, user_id: Uuid, keep: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(Column::IsDefault, Expr::value(false))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Id.ne(keep))
        .filter(Column::IsDefault.eq(true))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn user_addresses(
    state: &AppState,
    request: &RequestContext,
) -> AppResult<Vec<Address>> {
    let caller = request.authorize(Operation::ManageAddresses)?;
    list_for_user(&state.orm, caller.user_id).await
}

pub async fn get_address(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
) -> AppResult<Address> {
    let caller = request.authorize(Operation::ManageAddresses)?;
    owned_address(&state.orm, caller.user_id, id, false)
        .await
        .map(address_from_entity)
}

pub async fn create_address(
    state: &AppState,
    request: &RequestContext,
    payload: AddressInput,
) -> AppResult<Address> {
    let caller = request.authorize(Operation::ManageAddresses)?;
    payload.validate()?;

    let is_default = payload.is_default.unwrap_or(false);
    let txn = state.orm.begin().await?;
    let address = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(caller.user_id),
        full_name: Set(payload.full_name.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        country: Set(payload.country.trim().to_string()),
        phone: Set(normalize_phone(&payload.phone)),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    if is_default {
        clear_default(&txn, caller.user_id, address.id).await?;
    }
    txn.commit().await?;

    Ok(address_from_entity(address))
}

pub async fn update_address(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
    payload: AddressInput,
) -> AppResult<Address> {
    let caller = request.authorize(Operation::ManageAddresses)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let existing = owned_address(&txn, caller.user_id, id, true).await?;

    let mut active: ActiveModel = existing.into();
    active.full_name = Set(payload.full_name.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.country = Set(payload.country.trim().to_string());
    active.phone = Set(normalize_phone(&payload.phone));
    if let Some(is_default) = payload.is_default {
        active.is_default = Set(is_default);
        if is_default {
            clear_default(&txn, caller.user_id, id).await?;
        }
    }
    let address = active.update(&txn).await?;
    txn.commit().await?;

    Ok(address_from_entity(address))
}

/// Addresses used by an order are part of its history and cannot be removed.
pub async fn delete_address(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
) -> AppResult<Address> {
    let caller = request.authorize(Operation::ManageAddresses)?;

    let txn = state.orm.begin().await?;
    let existing = owned_address(&txn, caller.user_id, id, true).await?;

    let used = Orders::find()
        .filter(OrderCol::AddressId.eq(existing.id))
        .count(&txn)
        .await?;
    if used > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete address that has been used in orders".to_string(),
        ));
    }

    Addresses::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(address_from_entity(existing))
}
