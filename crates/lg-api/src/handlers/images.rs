//! Per-owner image CRUD. Uploads arrive as multipart forms; the bytes go to
//! the MediaStore, only the resulting URL reaches the data layer.

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use lg_core::access;
use lg_core::error::AppError;
use lg_core::models::Image;
use uuid::Uuid;

use super::{request_context, AppState};
use crate::error::ApiError;
use crate::requests::{normalize_tags, ImageListQuery, UpdateImageRequest};

fn multipart_err(err: actix_multipart::MultipartError) -> AppError {
    AppError::ValidationError(format!("invalid multipart payload: {err}"))
}

/// POST /images — fields: `file` (the bytes), `title`, optional
/// `description`, optional comma-separated `tags`.
pub async fn create_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut content_type = String::from("application/octet-stream");
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    while let Some(mut field) = payload.try_next().await.map_err(multipart_err)? {
        let name = field.name().to_string();
        if name == "file" {
            if let Some(mime) = field.content_type() {
                content_type = mime.to_string();
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_err)? {
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => file_bytes = Some(data),
            "title" => title = Some(String::from_utf8_lossy(&data).trim().to_string()),
            "description" => {
                let text = String::from_utf8_lossy(&data).trim().to_string();
                if !text.is_empty() {
                    description = Some(text);
                }
            }
            "tags" => {
                tags = normalize_tags(
                    String::from_utf8_lossy(&data)
                        .split(',')
                        .map(|t| t.to_string())
                        .collect(),
                );
            }
            // Unknown fields are ignored rather than rejected.
            _ => {}
        }
    }

    let file_bytes = file_bytes
        .ok_or_else(|| AppError::ValidationError("missing file field".to_string()))?;
    let title = title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::ValidationError("title must not be empty".to_string()))?;

    let media_id = state.store.save_upload(file_bytes, &content_type).await?;
    let image = Image {
        id: Uuid::now_v7(),
        owner_id: ctx.user_id,
        url: state.store.public_url(&media_id),
        title,
        description,
        tags,
        created_at: Utc::now(),
    };
    state.repo.create_image(image.clone()).await?;
    log::info!("image {} uploaded by {}", image.id, ctx.user_id);

    Ok(HttpResponse::Created().json(image))
}

pub async fn list_images(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ImageListQuery>,
) -> Result<HttpResponse, ApiError> {
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;
    let query = query.into_inner().validate()?;

    let page = state.repo.list_images(ctx.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let image_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;

    let image = state
        .repo
        .get_image(image_id)
        .await?
        // Another user's image reads as absent, same as gallery privacy.
        .filter(|img| img.owner_id == ctx.user_id)
        .ok_or_else(|| AppError::not_found("Image", image_id))?;
    Ok(HttpResponse::Ok().json(image))
}

pub async fn update_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let image_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;

    let mut image = state
        .repo
        .get_image(image_id)
        .await?
        .ok_or_else(|| AppError::not_found("Image", image_id))?;
    access::ensure_owner(ctx, image.owner_id)?;

    let patch = body.into_inner().validate()?;
    if let Some(title) = patch.title {
        image.title = title;
    }
    if let Some(description) = patch.description {
        image.description = description;
    }
    if let Some(tags) = patch.tags {
        image.tags = tags;
    }
    state.repo.update_image(image.clone()).await?;

    let updated = state
        .repo
        .get_image(image.id)
        .await?
        .ok_or_else(|| AppError::not_found("Image", image.id))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let image_id = path.into_inner();
    let ctx = request_context(&state, &req).await?;
    let ctx = access::require_auth(ctx.as_ref())?;

    let image = state
        .repo
        .get_image(image_id)
        .await?
        .ok_or_else(|| AppError::not_found("Image", image_id))?;
    access::ensure_owner(ctx, image.owner_id)?;

    state.repo.delete_image(image.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
