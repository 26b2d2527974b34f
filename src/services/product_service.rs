use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::record_audit,
    dto::products::{ProductInput, ProductPatch, ProductSortBy, SearchFilters, SortOrder},
    entity::{
        Products,
        products::{ActiveModel, Column, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::{auth::RequestContext, policy::Operation},
    models::{Product, ProductSuggestion, product_from_entity, suggestion_from_entity},
    services::category_service,
    state::AppState,
};

const SUGGESTION_LIMIT: u64 = 5;

pub async fn find_product<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

pub async fn get_product(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
) -> AppResult<Product> {
    request.authorize(Operation::ViewCatalog)?;
    find_product(&state.orm, id).await.map(product_from_entity)
}

pub async fn create_product(
    state: &AppState,
    request: &RequestContext,
    payload: ProductInput,
) -> AppResult<Product> {
    let seller = request.authorize(Operation::ManageProducts)?;
    payload.validate()?;

    let category = category_service::find_by_name(&state.orm, &payload.category_name).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller.user_id),
        category_id: Set(category.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        discount: Set(payload.discount.unwrap_or_default()),
        stock: Set(payload.stock),
        brand: Set(payload.brand.trim().to_string()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.pool,
        Some(seller.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(product_from_entity(product))
}

pub async fn update_product(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
    payload: ProductPatch,
) -> AppResult<Product> {
    let seller = request.authorize(Operation::ManageProducts)?;
    payload.validate()?;

    let existing = Products::find()
        .filter(Column::Id.eq(id))
        .filter(Column::SellerId.eq(seller.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(brand) = payload.brand {
        active.brand = Set(brand.trim().to_string());
    }
    if let Some(name) = payload.category_name {
        let category = category_service::find_by_name(&state.orm, &name).await?;
        active.category_id = Set(category.id);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    record_audit(
        &state.pool,
        Some(seller.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(product_from_entity(product))
}

pub async fn delete_product(
    state: &AppState,
    request: &RequestContext,
    id: Uuid,
) -> AppResult<Product> {
    let seller = request.authorize(Operation::ManageProducts)?;

    let existing = Products::find()
        .filter(Column::Id.eq(id))
        .filter(Column::SellerId.eq(seller.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let result = Products::delete_many()
        .filter(Column::Id.eq(existing.id))
        .filter(Column::SellerId.eq(seller.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product"));
    }

    record_audit(
        &state.pool,
        Some(seller.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": existing.id })),
    )
    .await;

    Ok(product_from_entity(existing))
}

pub async fn list_active_in_category<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
) -> AppResult<Vec<Product>> {
    let items = Products::find()
        .filter(Column::CategoryId.eq(category_id))
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();
    Ok(items)
}

pub async fn list_for_seller<C: ConnectionTrait>(
    db: &C,
    seller_id: Uuid,
    include_inactive: bool,
) -> AppResult<Vec<Product>> {
    let mut finder = Products::find().filter(Column::SellerId.eq(seller_id));
    if !include_inactive {
        finder = finder.filter(Column::IsActive.eq(true));
    }
    let items = finder
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();
    Ok(items)
}

pub async fn products_by_category(
    state: &AppState,
    request: &RequestContext,
    category_id: Uuid,
) -> AppResult<Vec<Product>> {
    request.authorize(Operation::ViewCatalog)?;
    category_service::find_category(&state.orm, category_id).await?;
    list_active_in_category(&state.orm, category_id).await
}

/// Inactive listings are only shown to the seller who owns them.
pub async fn products_by_seller(
    state: &AppState,
    request: &RequestContext,
    seller_id: Uuid,
) -> AppResult<Vec<Product>> {
    let caller = request.authorize(Operation::ViewCatalog)?;
    list_for_seller(&state.orm, seller_id, caller.user_id == seller_id).await
}

fn like_pattern(raw: &str) -> String {
    let escaped = raw
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn search_condition(filters: &SearchFilters) -> Condition {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(query) = filters.query.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(query);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern.clone()))
                .add(Expr::col(Column::Brand).ilike(pattern)),
        );
    }

    if let Some(category_id) = filters.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(brand) = filters.brand.as_deref().filter(|b| !b.trim().is_empty()) {
        condition = condition.add(Expr::col(Column::Brand).ilike(like_pattern(brand)));
    }

    if let Some(min_price) = filters.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = filters.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    condition
}

pub async fn search_products(
    state: &AppState,
    request: &RequestContext,
    filters: SearchFilters,
) -> AppResult<Vec<Product>> {
    request.authorize(Operation::ViewCatalog)?;
    filters.validate()?;

    let (_, limit, offset) = filters.normalize();
    let sort_col = match filters.sort_by.unwrap_or_default() {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Title => Column::Title,
        ProductSortBy::Stock => Column::Stock,
    };

    let mut finder = Products::find().filter(search_condition(&filters));
    finder = match filters.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let items = finder
        .order_by_asc(Column::Id)
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();
    Ok(items)
}

pub async fn suggestions(state: &AppState, query: String) -> AppResult<Vec<ProductSuggestion>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let filters = SearchFilters {
        query: Some(query),
        ..Default::default()
    };
    filters.validate()?;

    let items = Products::find()
        .filter(search_condition(&filters))
        .order_by_asc(Column::Title)
        .limit(SUGGESTION_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(suggestion_from_entity)
        .collect();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" 100%_cotton "), "%100\\%\\_cotton%");
        assert_eq!(like_pattern("boots"), "%boots%");
    }
}
