use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::Claims,
    entity::enums::Role,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

pub const TOKEN_COOKIE: &str = "token";

pub fn create_token(config: &AppConfig, user_id: Uuid, role: Role) -> AppResult<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(config.jwt_expire_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        timestamp: now.timestamp_millis(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(secret: &str, token: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthenticated)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthenticated)?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(config: &AppConfig, token: &str) -> String {
    let max_age = config.cookie_expire_hours * 3600;
    let mut cookie =
        format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}");
    if config.production {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie() -> String {
    format!("{TOKEN_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// Value of the session cookie inside one `Cookie` header.
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/unused".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: "test-secret".into(),
            jwt_expire_hours: 24,
            cookie_expire_hours: 24,
            allowed_origins: Vec::new(),
            production: false,
        }
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token = create_token(&config, user_id, Role::Seller).unwrap();

        let user = verify_token(&config.jwt_secret, &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, Role::Seller);
    }

    #[test]
    fn wrong_secret_is_unauthenticated() {
        let config = config();
        let token = create_token(&config, Uuid::new_v4(), Role::Buyer).unwrap();
        assert!(matches!(
            verify_token("another-secret", &token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let config = config();
        let issued = Utc::now() - Duration::hours(3);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: Role::Buyer,
            timestamp: issued.timestamp_millis(),
            exp: (issued + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verify_token(&config.jwt_secret, &token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn cookie_round_trip() {
        let config = config();
        let cookie = session_cookie(&config, "abc");
        assert!(cookie.starts_with("token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        assert_eq!(
            token_from_cookie_header("lang=en; token=abc").as_deref(),
            Some("abc")
        );
        assert_eq!(token_from_cookie_header("token="), None);
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
