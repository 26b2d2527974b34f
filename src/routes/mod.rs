use axum::{Extension, Router, routing::get};

use crate::{graphql::AppSchema, state::AppState};

pub mod doc;
pub mod graphql;
pub mod health;

// State is bound at the top level.
pub fn create_api_router(schema: AppSchema) -> Router<AppState> {
    Router::new()
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .layer(Extension(schema))
}
