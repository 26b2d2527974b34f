use async_graphql::{ErrorExtensions, ServerError};
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Authorization required")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Value of the `code` extension on the GraphQL error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Validation(_) => "BAD_USER_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_)
        )
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let message = if self.is_internal() {
            tracing::error!(error = ?self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        let code = self.code();
        async_graphql::Error::new(message).extend_with(|_, ext| ext.set("code", code))
    }
}

/// Failures raised before the schema runs, such as a bad session token.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let err = self.extend();
        let mut server_error = ServerError::new(err.message, None);
        server_error.extensions = err.extensions;
        let body = Json(async_graphql::Response::from_errors(vec![server_error]));

        if matches!(self, AppError::Unauthenticated) {
            let clear = crate::services::token_service::clear_cookie();
            return (status, [(header::SET_COOKIE, clear)], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .find_map(|(field, errs)| {
                errs.first().map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .unwrap_or_else(|| "Invalid input".to_string());

        AppError::Validation(message)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(err: &async_graphql::Error) -> Option<String> {
        let value = err.extensions.as_ref()?.get("code")?;
        match value {
            async_graphql::Value::String(code) => Some(code.clone()),
            _ => None,
        }
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = AppError::NotFound("Cart");
        assert_eq!(err.to_string(), "Cart not found");
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn extension_carries_code() {
        let gql = AppError::Forbidden.extend();
        assert_eq!(gql.message, "Authorization required");
        assert_eq!(code_of(&gql).as_deref(), Some("FORBIDDEN"));
    }

    #[test]
    fn internal_detail_is_not_forwarded() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset by peer"));
        let gql = err.extend();
        assert_eq!(gql.message, "Internal Server Error");
        assert_eq!(code_of(&gql).as_deref(), Some("INTERNAL_SERVER_ERROR"));
    }

    #[test]
    fn invalid_session_clears_cookie() {
        let response = AppError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(cookie.starts_with("token=;"));
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let mut errors = ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("name must be between 6 and 50 characters".into());
        errors.add("name", err);

        let app: AppError = errors.into();
        assert_eq!(app.code(), "BAD_USER_INPUT");
        assert_eq!(app.to_string(), "name must be between 6 and 50 characters");
    }
}
