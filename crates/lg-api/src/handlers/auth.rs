//! Registration and login.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use lg_core::error::AppError;
use lg_core::models::{Role, User};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;
use crate::requests::{LoginRequest, RegisterRequest};

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner().validate()?;
    state
        .auth_limiter
        .check(&format!("register:{}", request.email))?;

    if state
        .repo
        .get_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("email already registered".into()).into());
    }
    if state
        .repo
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("username already taken".into()).into());
    }

    let user = User {
        id: Uuid::now_v7(),
        email: request.email,
        username: request.username,
        password_hash: state.auth.hash_password(&request.password)?,
        role: Role::User,
        created_at: Utc::now(),
    };
    state.repo.create_user(user.clone()).await?;
    log::info!("registered user {}", user.id);

    let token = state.auth.issue_token(user.id);
    Ok(HttpResponse::Created().json(json!({ "token": token, "user": user })))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let email = request.email.trim();
    // Limit before touching credentials, so a drained bucket also stops
    // password probing.
    state.auth_limiter.check(&format!("login:{email}"))?;

    // One error message for both unknown email and bad password, so the
    // endpoint can't be used to probe which emails are registered.
    let invalid = || AppError::Unauthorized("invalid credentials".to_string());

    let user = state
        .repo
        .get_user_by_email(email)
        .await?
        .ok_or_else(invalid)?;
    if !state
        .auth
        .verify_password(&request.password, &user.password_hash)
    {
        return Err(invalid().into());
    }

    let token = state.auth.issue_token(user.id);
    Ok(HttpResponse::Ok().json(json!({ "token": token, "user": user })))
}
