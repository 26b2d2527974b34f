use async_graphql::{Context, Object, Result};

use crate::{
    dto::auth::{EmailUpdate, LoginInput, NameUpdate, PasswordChange, PhoneUpdate, SignupInput},
    graphql::{IntoGql, request_parts},
    models::{AuthPayload, User},
    services::{auth_service, token_service, user_service},
};

#[derive(Default)]
pub struct AccountQuery;

#[Object(rename_args = "snake_case")]
impl AccountQuery {
    /// The signed-in user.
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        let (state, request) = request_parts(ctx)?;
        user_service::current_user(state, request).await.into_gql()
    }
}

#[derive(Default)]
pub struct AccountMutation;

#[Object(rename_args = "snake_case")]
impl AccountMutation {
    async fn signup(&self, ctx: &Context<'_>, input: SignupInput) -> Result<AuthPayload> {
        let (state, _) = request_parts(ctx)?;
        let session = auth_service::signup(state, input).await.into_gql()?;
        ctx.append_http_header(
            "set-cookie",
            token_service::session_cookie(&state.config, &session.token),
        );
        Ok(AuthPayload {
            token: session.token,
            user: session.user,
        })
    }

    async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<AuthPayload> {
        let (state, _) = request_parts(ctx)?;
        let session = auth_service::login(state, input).await.into_gql()?;
        ctx.append_http_header(
            "set-cookie",
            token_service::session_cookie(&state.config, &session.token),
        );
        Ok(AuthPayload {
            token: session.token,
            user: session.user,
        })
    }

    async fn logout(&self, ctx: &Context<'_>) -> bool {
        ctx.append_http_header("set-cookie", token_service::clear_cookie());
        true
    }

    async fn update_name(&self, ctx: &Context<'_>, name: String) -> Result<User> {
        let (state, request) = request_parts(ctx)?;
        user_service::update_name(state, request, NameUpdate { name })
            .await
            .into_gql()
    }

    async fn update_email(&self, ctx: &Context<'_>, email: String) -> Result<User> {
        let (state, request) = request_parts(ctx)?;
        user_service::update_email(state, request, EmailUpdate { email })
            .await
            .into_gql()
    }

    async fn update_phone(&self, ctx: &Context<'_>, phone: String) -> Result<User> {
        let (state, request) = request_parts(ctx)?;
        user_service::update_phone(state, request, PhoneUpdate { phone })
            .await
            .into_gql()
    }

    async fn update_password(
        &self,
        ctx: &Context<'_>,
        current_password: String,
        new_password: String,
    ) -> Result<User> {
        let (state, request) = request_parts(ctx)?;
        let payload = PasswordChange {
            current_password,
            new_password,
        };
        user_service::update_password(state, request, payload)
            .await
            .into_gql()
    }

    async fn delete_user(&self, ctx: &Context<'_>) -> Result<User> {
        let (state, request) = request_parts(ctx)?;
        let user = user_service::delete_user(state, request).await.into_gql()?;
        ctx.append_http_header("set-cookie", token_service::clear_cookie());
        Ok(user)
    }
}
