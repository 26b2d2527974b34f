use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::{
    dto::addresses::AddressInput,
    graphql::{IntoGql, request_parts},
    models::Address,
    services::address_service,
};

#[derive(Default)]
pub struct AddressQuery;

#[Object(rename_args = "snake_case")]
impl AddressQuery {
    async fn get_user_addresses(&self, ctx: &Context<'_>) -> Result<Vec<Address>> {
        let (state, request) = request_parts(ctx)?;
        address_service::user_addresses(state, request)
            .await
            .into_gql()
    }

    async fn get_address(&self, ctx: &Context<'_>, address_id: Uuid) -> Result<Address> {
        let (state, request) = request_parts(ctx)?;
        address_service::get_address(state, request, address_id)
            .await
            .into_gql()
    }
}

#[derive(Default)]
pub struct AddressMutation;

#[Object(rename_args = "snake_case")]
impl AddressMutation {
    async fn create_address(&self, ctx: &Context<'_>, data: AddressInput) -> Result<Address> {
        let (state, request) = request_parts(ctx)?;
        address_service::create_address(state, request, data)
            .await
            .into_gql()
    }

    async fn update_address(
        &self,
        ctx: &Context<'_>,
        address_id: Uuid,
        data: AddressInput,
    ) -> Result<Address> {
        let (state, request) = request_parts(ctx)?;
        address_service::update_address(state, request, address_id, data)
            .await
            .into_gql()
    }

    async fn delete_address(&self, ctx: &Context<'_>, address_id: Uuid) -> Result<Address> {
        let (state, request) = request_parts(ctx)?;
        address_service::delete_address(state, request, address_id)
            .await
            .into_gql()
    }
}
