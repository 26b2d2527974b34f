use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension,
    response::{Html, IntoResponse},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{graphql::AppSchema, middleware::auth::RequestContext};

/// Standard GraphQL-over-HTTP request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct GraphQLPayload {
    pub query: String,
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
    #[schema(value_type = Object)]
    pub variables: Option<serde_json::Value>,
}

/// Runs one GraphQL operation. The caller is resolved from the `token` cookie or a bearer
/// header before the schema runs; an invalid token fails the whole request.
#[utoipa::path(
    post,
    path = "/graphql",
    request_body = GraphQLPayload,
    responses(
        (status = 200, description = "GraphQL response with `data` and/or `errors`"),
        (status = 401, description = "Session token is invalid or expired"),
    ),
    tag = "GraphQL"
)]
pub async fn graphql_handler(
    Extension(schema): Extension<AppSchema>,
    request: RequestContext,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request_id = request.request_id().unwrap_or("-").to_string();
    let caller = request
        .caller()
        .map(|user| user.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    tracing::debug!(request_id = %request_id, caller = %caller, "graphql request");

    schema.execute(req.into_inner().data(request)).await.into()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
