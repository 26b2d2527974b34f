use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::record_audit,
    dto::{
        auth::{LoginInput, SignupInput},
        validators::normalize_phone,
    },
    entity::{
        Users, carts::ActiveModel as CartActive, enums::Role,
        users::{ActiveModel as UserActive, Column as UserCol},
    },
    error::{AppError, AppResult},
    models::{User, user_from_entity},
    services::token_service,
    state::AppState,
};

/// Signed-in user plus the token to hand back as cookie and payload.
pub struct Session {
    pub user: User,
    pub token: String,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn signup(state: &AppState, input: SignupInput) -> AppResult<Session> {
    input.validate()?;
    if input.role == Role::Admin {
        return Err(AppError::Validation(
            "role must be Buyer or Seller".to_string(),
        ));
    }

    let email = input.email.trim().to_lowercase();
    let taken = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&input.password)?;

    let txn = state.orm.begin().await?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        email: Set(email),
        phone: Set(Some(normalize_phone(&input.phone))),
        password_hash: Set(password_hash),
        role: Set(input.role),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let token = token_service::create_token(&state.config, user.id, user.role)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user signed up");
    record_audit(
        &state.pool,
        Some(user.id),
        "user_signup",
        Some("users"),
        Some(serde_json::json!({ "role": user.role.as_str() })),
    )
    .await;

    Ok(Session {
        user: user_from_entity(user),
        token,
    })
}

pub async fn login(state: &AppState, input: LoginInput) -> AppResult<Session> {
    input.validate()?;
    let email = input.email.trim().to_lowercase();

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid email or password".into()))?;

    if !verify_password(&input.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = token_service::create_token(&state.config, user.id, user.role)?;
    record_audit(&state.pool, Some(user.id), "user_login", Some("users"), None).await;

    Ok(Session {
        user: user_from_entity(user),
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password("repeat-me").unwrap();
        let second = hash_password("repeat-me").unwrap();
        assert_ne!(first, second);
    }
}
