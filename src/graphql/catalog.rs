use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::{
    dto::products::{ProductInput, ProductPatch, SearchFilters},
    graphql::{IntoGql, request_parts},
    models::{Category, Product, ProductSuggestion},
    services::{category_service, product_service},
};

#[derive(Default)]
pub struct CatalogQuery;

#[Object(rename_args = "snake_case")]
impl CatalogQuery {
    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<Category>> {
        let (state, request) = request_parts(ctx)?;
        category_service::list_categories(state, request)
            .await
            .into_gql()
    }

    async fn get_product(&self, ctx: &Context<'_>, product_id: Uuid) -> Result<Product> {
        let (state, request) = request_parts(ctx)?;
        product_service::get_product(state, request, product_id)
            .await
            .into_gql()
    }

    async fn products_by_category(
        &self,
        ctx: &Context<'_>,
        category_id: Uuid,
    ) -> Result<Vec<Product>> {
        let (state, request) = request_parts(ctx)?;
        product_service::products_by_category(state, request, category_id)
            .await
            .into_gql()
    }

    async fn products_by_seller(&self, ctx: &Context<'_>, seller_id: Uuid) -> Result<Vec<Product>> {
        let (state, request) = request_parts(ctx)?;
        product_service::products_by_seller(state, request, seller_id)
            .await
            .into_gql()
    }

    /// Active products matching the filters, 12 per page unless `limit` says otherwise.
    async fn search_products(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] filters: SearchFilters,
    ) -> Result<Vec<Product>> {
        let (state, request) = request_parts(ctx)?;
        product_service::search_products(state, request, filters)
            .await
            .into_gql()
    }

    async fn get_product_suggestions(
        &self,
        ctx: &Context<'_>,
        query: String,
    ) -> Result<Vec<ProductSuggestion>> {
        let (state, _) = request_parts(ctx)?;
        product_service::suggestions(state, query).await.into_gql()
    }
}

#[derive(Default)]
pub struct CatalogMutation;

#[Object(rename_args = "snake_case")]
impl CatalogMutation {
    async fn add_product(&self, ctx: &Context<'_>, data: ProductInput) -> Result<Product> {
        let (state, request) = request_parts(ctx)?;
        product_service::create_product(state, request, data)
            .await
            .into_gql()
    }

    async fn update_product(
        &self,
        ctx: &Context<'_>,
        product_id: Uuid,
        details: ProductPatch,
    ) -> Result<Product> {
        let (state, request) = request_parts(ctx)?;
        product_service::update_product(state, request, product_id, details)
            .await
            .into_gql()
    }

    async fn delete_product(&self, ctx: &Context<'_>, product_id: Uuid) -> Result<Product> {
        let (state, request) = request_parts(ctx)?;
        product_service::delete_product(state, request, product_id)
            .await
            .into_gql()
    }

    async fn add_category(
        &self,
        ctx: &Context<'_>,
        category: String,
        parent_id: Option<Uuid>,
    ) -> Result<Category> {
        let (state, request) = request_parts(ctx)?;
        category_service::create_category(state, request, category, parent_id)
            .await
            .into_gql()
    }

    async fn update_category_name(
        &self,
        ctx: &Context<'_>,
        category_id: Uuid,
        category: String,
    ) -> Result<Category> {
        let (state, request) = request_parts(ctx)?;
        category_service::rename_category(state, request, category_id, category)
            .await
            .into_gql()
    }

    async fn delete_category(&self, ctx: &Context<'_>, category_id: Uuid) -> Result<Category> {
        let (state, request) = request_parts(ctx)?;
        category_service::delete_category(state, request, category_id)
            .await
            .into_gql()
    }
}
