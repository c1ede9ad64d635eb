//! # lg-api
//!
//! The web routing and orchestration layer for Lumen-Gallery.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod requests;

use actix_web::web;
use error::ApiError;
use lg_core::error::AppError;

/// Configures the routes for the gallery API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Malformed JSON bodies get the same structured error shape as
    // everything else.
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(AppError::ValidationError(err.to_string())).into()
    }));

    cfg.service(
        web::scope("")
            // Sessions
            .route("/auth/register", web::post().to(handlers::auth::register))
            .route("/auth/login", web::post().to(handlers::auth::login))
            // Galleries and their ordered membership
            .route("/galleries", web::post().to(handlers::galleries::create_gallery))
            .route("/galleries", web::get().to(handlers::galleries::list_galleries))
            .route("/galleries/{id}", web::get().to(handlers::galleries::get_gallery))
            .route("/galleries/{id}", web::patch().to(handlers::galleries::update_gallery))
            .route("/galleries/{id}", web::delete().to(handlers::galleries::delete_gallery))
            .route(
                "/galleries/{id}/images/order",
                web::patch().to(handlers::galleries::reorder_images),
            )
            .route(
                "/galleries/{id}/images/{membership_id}",
                web::delete().to(handlers::galleries::remove_image),
            )
            // Images
            .route("/images", web::post().to(handlers::images::create_image))
            .route("/images", web::get().to(handlers::images::list_images))
            .route("/images/{id}", web::get().to(handlers::images::get_image))
            .route("/images/{id}", web::patch().to(handlers::images::update_image))
            .route("/images/{id}", web::delete().to(handlers::images::delete_image))
            // Users
            .route("/users/{id}", web::get().to(handlers::users::get_user))
            .route("/users/{id}", web::delete().to(handlers::users::delete_user))
            .route("/users/{id}/admin", web::put().to(handlers::users::set_admin))
            // Test-only cleanup, gated by the TEST_MODE flag
            .route("/test/reset", web::post().to(handlers::test_reset)),
    );
}
