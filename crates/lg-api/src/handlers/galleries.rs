//! Gallery CRUD plus the ordered-membership operations.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use lg_core::access;
use lg_core::compose;
use lg_core::error::AppError;
use lg_core::models::Gallery;
use uuid::Uuid;

use super::{request_context, AppState};
use crate::error::ApiError;
use crate::requests::{CreateGalleryRequest, ReorderRequest, UpdateGalleryRequest};

/// Loads a gallery and checks the caller owns it. All mutations funnel
/// through here.
async fn owned_gallery(
    state: &AppState,
    req: &HttpRequest,
    gallery_id: Uuid,
) -> Result<Gallery, ApiError> {
    let ctx = request_context(state, req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;
    let gallery = state
        .repo
        .get_gallery(gallery_id)
        .await?
        .ok_or_else(|| AppError::not_found("Gallery", gallery_id))?;
    // Same visibility rule as reads: a private gallery answers NotFound to
    // other users, so mutations never confirm it exists.
    access::ensure_gallery_visible(Some(ctx), &gallery)?;
    access::ensure_owner(ctx, gallery.owner_id)?;
    Ok(gallery)
}

pub async fn create_gallery(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateGalleryRequest>,
) -> Result<HttpResponse, ApiError> {
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;
    let validated = body.into_inner().validate()?;

    // Ownership and cover checks run before any write: a rejected request
    // leaves zero rows behind.
    let image_ids: Vec<Uuid> = validated.drafts.iter().map(|d| d.image_id).collect();
    let found = state.repo.get_images_by_ids(&image_ids).await?;
    access::ensure_images_owned(ctx.user_id, &image_ids, &found)?;
    compose::validate_cover(validated.cover_image_id, &image_ids)?;

    let gallery = Gallery {
        id: Uuid::now_v7(),
        owner_id: ctx.user_id,
        title: validated.title,
        description: validated.description,
        is_public: validated.is_public,
        cover_image_id: validated.cover_image_id,
        theme: validated.theme,
        created_at: Utc::now(),
    };
    let memberships = compose::build_memberships(gallery.id, validated.drafts)?;
    state.repo.create_gallery(gallery.clone(), memberships).await?;

    let detail = state
        .repo
        .get_gallery_detail(gallery.id)
        .await?
        .ok_or_else(|| AppError::not_found("Gallery", gallery.id))?;
    Ok(HttpResponse::Created().json(detail))
}

pub async fn list_galleries(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let ctx = request_context(&state, &req).await?;
    let galleries = state
        .repo
        .list_galleries(ctx.map(|c| c.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(galleries))
}

pub async fn get_gallery(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let gallery_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;

    let detail = state
        .repo
        .get_gallery_detail(gallery_id)
        .await?
        .ok_or_else(|| AppError::not_found("Gallery", gallery_id))?;
    access::ensure_gallery_visible(ctx.as_ref(), &detail.gallery)?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn update_gallery(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateGalleryRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut gallery = owned_gallery(&state, &req, path.into_inner()).await?;
    let patch = body.into_inner().validate()?;
    let replacement = patch.apply(&mut gallery);

    // The cover must sit inside the membership the update results in,
    // whether that set is being replaced or kept.
    let resulting_image_ids: Vec<Uuid> = match &replacement {
        Some(drafts) => {
            let ids: Vec<Uuid> = drafts.iter().map(|d| d.image_id).collect();
            let found = state.repo.get_images_by_ids(&ids).await?;
            access::ensure_images_owned(gallery.owner_id, &ids, &found)?;
            ids
        }
        None => state
            .repo
            .list_memberships(gallery.id)
            .await?
            .iter()
            .map(|m| m.image_id)
            .collect(),
    };
    compose::validate_cover(gallery.cover_image_id, &resulting_image_ids)?;

    let memberships = match replacement {
        Some(drafts) => Some(compose::build_memberships(gallery.id, drafts)?),
        None => None,
    };
    state.repo.update_gallery(gallery.clone(), memberships).await?;

    let detail = state
        .repo
        .get_gallery_detail(gallery.id)
        .await?
        .ok_or_else(|| AppError::not_found("Gallery", gallery.id))?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn delete_gallery(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let gallery = owned_gallery(&state, &req, path.into_inner()).await?;
    state.repo.delete_gallery(gallery.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /galleries/{id}/images/{membership_id}
///
/// The second path segment is the membership id, never the image id — the
/// repo answers NotFound for ids from the wrong space.
pub async fn remove_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, ApiError> {
    let (gallery_id, membership_id) = path.into_inner();
    let gallery = owned_gallery(&state, &req, gallery_id).await?;
    state
        .repo
        .remove_membership(gallery.id, membership_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /galleries/{id}/images/order
pub async fn reorder_images(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ReorderRequest>,
) -> Result<HttpResponse, ApiError> {
    let gallery = owned_gallery(&state, &req, path.into_inner()).await?;
    let sequence = body.into_inner().validate()?;
    state
        .repo
        .reorder_memberships(gallery.id, &sequence)
        .await?;

    let detail = state
        .repo
        .get_gallery_detail(gallery.id)
        .await?
        .ok_or_else(|| AppError::not_found("Gallery", gallery.id))?;
    Ok(HttpResponse::Ok().json(detail))
}
