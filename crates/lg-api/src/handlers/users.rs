//! User profile access, admin role toggling, and account deletion.

use actix_web::{web, HttpRequest, HttpResponse};
use lg_core::access;
use lg_core::error::AppError;
use lg_core::models::Role;
use uuid::Uuid;

use super::{request_context, AppState};
use crate::error::ApiError;
use crate::requests::AdminToggleRequest;

/// GET /users/{id} — the user themself, or an admin.
pub async fn get_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;
    access::ensure_self_or_admin(ctx, user_id)?;

    let user = state
        .repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user_id))?;
    Ok(HttpResponse::Ok().json(user))
}

/// PUT /users/{id}/admin — admin-only role toggle.
pub async fn set_admin(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<AdminToggleRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;
    access::ensure_admin(ctx)?;

    let role = if body.is_admin { Role::Admin } else { Role::User };
    if !state.repo.set_user_role(user_id, role).await? {
        return Err(AppError::not_found("User", user_id).into());
    }
    log::info!("user {user_id} role set to {role:?} by {}", ctx.user_id);

    let user = state
        .repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user_id))?;
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /users/{id} — self-service deletion (admins may also remove
/// accounts). Cascades to owned images and galleries.
pub async fn delete_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;
    access::ensure_self_or_admin(ctx, user_id)?;

    if !state.repo.delete_user(user_id).await? {
        return Err(AppError::not_found("User", user_id).into());
    }
    Ok(HttpResponse::NoContent().finish())
}
