use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    entity::enums::Role,
    error::AppError,
    middleware::policy::{self, Operation},
    services::token_service::{self, TOKEN_COOKIE},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Who is calling, resolved once per request and shared with every resolver.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    caller: Option<AuthUser>,
    request_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: AuthUser) -> Self {
        Self {
            caller: Some(user),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn caller(&self) -> Option<&AuthUser> {
        self.caller.as_ref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn require_auth(&self) -> Result<&AuthUser, AppError> {
        self.caller.as_ref().ok_or(AppError::Unauthenticated)
    }

    /// Authenticated caller whose role may perform `operation`.
    pub fn authorize(&self, operation: Operation) -> Result<&AuthUser, AppError> {
        let user = self.require_auth()?;
        if !policy::allows(operation, user.role) {
            tracing::debug!(
                user_id = %user.user_id,
                role = user.role.as_str(),
                ?operation,
                "operation denied"
            );
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }
}

/// Token from the `token` cookie, falling back to a bearer `Authorization` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_service::token_from_cookie_header);
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub fn resolve_request_context(
    config: &AppConfig,
    headers: &HeaderMap,
) -> Result<RequestContext, AppError> {
    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let Some(token) = token_from_headers(headers) else {
        return Ok(RequestContext::anonymous().with_request_id(request_id));
    };

    let user = token_service::verify_token(&config.jwt_secret, &token).inspect_err(|_| {
        tracing::debug!(cookie = TOKEN_COOKIE, "rejected session token");
    })?;
    Ok(RequestContext::authenticated(user).with_request_id(request_id))
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_request_context(&state.config, &parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_wins_over_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn no_credentials_means_anonymous() {
        let headers = HeaderMap::new();
        assert!(token_from_headers(&headers).is_none());
        let ctx = RequestContext::anonymous();
        assert!(matches!(ctx.require_auth(), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn authorize_checks_role() {
        let ctx = RequestContext::authenticated(AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Seller,
        });
        assert!(ctx.authorize(Operation::ManageProducts).is_ok());
        assert!(matches!(
            ctx.authorize(Operation::ManageCart),
            Err(AppError::Forbidden)
        ));
    }
}
