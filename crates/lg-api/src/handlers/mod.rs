//! # lg-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Every handler follows the same shape: resolve the request context,
//! validate the payload, run the access gate, then persist.

pub mod auth;
pub mod galleries;
pub mod images;
pub mod users;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use lg_core::access::RequestContext;
use lg_core::error::AppError;
use lg_core::traits::{AuthProvider, GalleryRepo, MediaStore};

use crate::error::ApiError;
use crate::middleware::RateLimiter;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn GalleryRepo>,
    pub store: Box<dyn MediaStore>,
    pub auth: Box<dyn AuthProvider>,
    /// Per-identity limiter for login/register attempts.
    pub auth_limiter: RateLimiter,
    /// Gates the destructive /test/reset endpoint.
    pub test_mode: bool,
}

/// Resolves the caller identity from the Authorization header.
///
/// Returns Ok(None) when the header is absent (anonymous request); a header
/// that is present but invalid is an error, not anonymity. The role is read
/// fresh from the store on every request — authorization decisions are
/// never cached.
pub async fn request_context(
    state: &AppState,
    req: &HttpRequest,
) -> Result<Option<RequestContext>, ApiError> {
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(None),
    };
    let token = header_value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("malformed Authorization header".into()))?;
    let user_id = state
        .auth
        .verify_token(token)
        .ok_or_else(|| AppError::Unauthorized("invalid or expired token".into()))?;
    let user = state
        .repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;

    Ok(Some(RequestContext {
        user_id: user.id,
        role: user.role,
    }))
}

/// POST /test/reset — wipes every row. Only live when the binary runs with
/// TEST_MODE=1; otherwise the route pretends not to exist.
pub async fn test_reset(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    if !state.test_mode {
        return Err(AppError::not_found("Route", "/test/reset").into());
    }
    state.repo.wipe_all().await?;
    Ok(HttpResponse::NoContent().finish())
}
