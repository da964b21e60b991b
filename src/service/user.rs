use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    db,
    dto::{AuthUserResponse, LoginUserRequest, RegisterRequest, UpdateProfileDto},
    errors::AppError,
    models::{Profile, User},
    PGPool,
};

use super::{auth::{jwt, UserAuthData}, crypto};

/// Token settings shared by register and login.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub ttl_secs: i64,
}

pub async fn register(dto: RegisterRequest, tokens: &TokenSettings, pool: &PGPool) -> Result<AuthUserResponse, AppError> {
    dto.validate()?;
    let username = dto.username.trim().to_string();
    let taken = format!("username '{username}' is already taken");
    if db::user::exists(&username, pool).await? {
        return Err(AppError::Conflict(taken));
    }
    let id = Uuid::new_v4();
    let token = jwt::create(&tokens.secret, &id, &username, tokens.ttl_secs)?;
    let user = User {
        id,
        pwd_hash: crypto::hash_password(&id, &dto.pwd),
        username,
        display_name: dto.display_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        avatar_url: None,
        access_token: Some(token.clone()),
        created_at: Utc::now(),
    };
    // A concurrent registration can still win the race to the unique index.
    let user = db::user::create(&user, pool)
        .await
        .map_err(|err| AppError::conflict_on_unique(err, taken))?;
    info!("registered user {}", user.username);
    Ok(AuthUserResponse {
        message: "Registration successful".into(),
        token,
    })
}

pub async fn login(dto: LoginUserRequest, tokens: &TokenSettings, pool: &PGPool) -> Result<AuthUserResponse, AppError> {
    let user = db::user::get_by_username(dto.username.trim(), pool)
        .await?
        .filter(|u| crypto::verify_password(&u.id, &dto.pwd, &u.pwd_hash))
        .ok_or(AppError::Unauthorized)?;
    let token = jwt::create(&tokens.secret, &user.id, &user.username, tokens.ttl_secs)?;
    db::user::set_access_token(user.id, Some(&token), pool).await?;
    info!("user {} logged in", user.username);
    Ok(AuthUserResponse {
        message: "Login successful".into(),
        token,
    })
}

pub async fn logout(user_auth_data: &UserAuthData, pool: &PGPool) -> Result<(), AppError> {
    db::user::set_access_token(user_auth_data.user_id, None, pool).await?;
    info!("user {} logged out", user_auth_data.username);
    Ok(())
}

pub async fn me(user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Profile, AppError> {
    db::user::get_profile(user_auth_data.user_id, pool)
        .await?
        .ok_or_else(|| AppError::not_found("profile not found"))
}

pub async fn update_profile(
    user_auth_data: &UserAuthData,
    dto: UpdateProfileDto,
    pool: &PGPool,
) -> Result<Profile, AppError> {
    let user = db::user::set_profile_fields(user_auth_data.user_id, &dto, pool).await?;
    Ok(user.into())
}
