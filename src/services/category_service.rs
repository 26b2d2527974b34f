use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::record_audit,
    dto::products::CategoryName,
    entity::{
        Categories, Products,
        categories::{ActiveModel, Column, Model as CategoryModel},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{Category, category_from_entity},
    state::AppState,
};

pub async fn find_category<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Category> {
    Categories::find_by_id(id)
        .one(db)
        .await?
        .map(category_from_entity)
        .ok_or(AppError::NotFound("Category"))
}

pub(crate) async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<CategoryModel> {
    Categories::find()
        .filter(Column::Name.eq(name.trim()))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Category"))
}

pub async fn children_of<C: ConnectionTrait>(db: &C, parent_id: Uuid) -> AppResult<Vec<Category>> {
    let items = Categories::find()
        .filter(Column::ParentId.eq(parent_id))
        .order_by_asc(Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    Ok(items)
}

pub async fn list_categories(
    state: &AppState,
    request: &RequestContext,
) -> AppResult<Vec<Category>> {
    request.authorize(Operation::ViewCatalog)?;
    let items = Categories::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    Ok(items)
}

async fn ensure_name_free<C: ConnectionTrait>(db: &C, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Categories::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(db).await?.is_some() {
        return Err(AppError::BadRequest("Category already exists".to_string()));
    }
    Ok(())
}

pub async fn create_category(
    state: &AppState,
    request: &RequestContext,
    name: String,
    parent_id: Option<Uuid>,
) -> AppResult<Category> {
    let admin = request.authorize(Operation::ManageCategories)?;
    let payload = CategoryName {
        name: name.trim().to_string(),
    };
    payload.validate()?;

    ensure_name_free(&state.orm, &payload.name, None).await?;
    if let Some(parent_id) = parent_id {
        find_category(&state.orm, parent_id).await?;
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        parent_id: Set(parent_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.pool,
        Some(admin.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await;

    Ok(category_from_entity(category))
}

pub async fn rename_category(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
    name: String,
) -> AppResult<Category> {
    request.authorize(Operation::ManageCategories)?;
    let payload = CategoryName {
        name: name.trim().to_string(),
    };
    payload.validate()?;

    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Category"))?;
    ensure_name_free(&state.orm, &payload.name, Some(id)).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    let category = active.update(&state.orm).await?;
    Ok(category_from_entity(category))
}

/// Children are detached by the foreign key; categories still holding products stay.
pub async fn delete_category(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
) -> AppResult<Category> {
    let admin = request.authorize(Operation::ManageCategories)?;

    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    let products = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if products > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete a category that still has products".to_string(),
        ));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;

    record_audit(
        &state.pool,
        Some(admin.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await;

    Ok(category_from_entity(existing))
}
