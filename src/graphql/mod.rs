use async_graphql::{Context, EmptySubscription, ErrorExtensions, MergedObject, Schema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{auth::RequestContext, policy::ensure_self_or_admin},
    state::AppState,
};

mod account;
mod addresses;
mod cart;
mod catalog;
mod orders;
mod reviews;
mod wishlist;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    account::AccountQuery,
    catalog::CatalogQuery,
    cart::CartQuery,
    orders::OrderQuery,
    addresses::AddressQuery,
    reviews::ReviewQuery,
    wishlist::WishlistQuery,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    account::AccountMutation,
    catalog::CatalogMutation,
    cart::CartMutation,
    orders::OrderMutation,
    addresses::AddressMutation,
    reviews::ReviewMutation,
    wishlist::WishlistMutation,
);

pub fn build_schema(state: AppState) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(state)
    .extension(async_graphql::extensions::Tracing)
    .finish()
}

/// Service errors keep their `code` extension on the way out.
pub(crate) trait IntoGql<T> {
    fn into_gql(self) -> async_graphql::Result<T>;
}

impl<T> IntoGql<T> for AppResult<T> {
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|err| err.extend())
    }
}

pub(crate) fn request_parts<'c>(
    ctx: &Context<'c>,
) -> async_graphql::Result<(&'c AppState, &'c RequestContext)> {
    let state = ctx.data::<AppState>()?;
    let request = ctx.data::<RequestContext>()?;
    Ok((state, request))
}

/// State for resolvers on data owned by `owner_id`.
pub(crate) fn owner_scope<'c>(
    ctx: &Context<'c>,
    owner_id: Uuid,
) -> async_graphql::Result<&'c AppState> {
    let (state, request) = request_parts(ctx)?;
    let caller = request.require_auth().map_err(|err| err.extend())?;
    ensure_self_or_admin(caller, owner_id).map_err(|err| err.extend())?;
    Ok(state)
}
