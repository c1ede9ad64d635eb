//! # Lumen-Gallery Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use lg_api::handlers::AppState;
use lg_api::middleware;

// Feature-gated imports: the binary is compiled to order
#[cfg(feature = "db-sqlite")]
use lg_db_sqlite::SqliteGalleryStore;

#[cfg(feature = "storage-local")]
use lg_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use lg_auth_simple::SimpleAuthProvider;

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url = env_or("DATABASE_URL", "sqlite:lumen_gallery.db");
    let bind_addr = env_or("BIND_ADDR", "127.0.0.1:8080");
    let upload_dir = env_or("UPLOAD_DIR", "./data/uploads");
    let url_prefix = env_or("UPLOAD_URL_PREFIX", "/static/uploads");
    let test_mode = env_or("TEST_MODE", "0") == "1";
    let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
        log::warn!("SESSION_SECRET not set; sessions will not survive a restart");
        uuid::Uuid::new_v4().to_string()
    });

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteGalleryStore::new(&database_url)
        .await
        .expect("Failed to init SQLite");

    // 2. Initialize Storage Implementation
    #[cfg(feature = "storage-local")]
    let store = LocalMediaStore::new(upload_dir.clone().into(), url_prefix.clone());

    // 3. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new(&session_secret);

    // 4. Wrap in AppState (dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        store: Box::new(store),
        auth: Box::new(auth),
        // 5 burst attempts per identity, refilling one every 2 seconds
        auth_limiter: middleware::RateLimiter::new(5.0, 0.5),
        test_mode,
    });

    if test_mode {
        log::warn!("TEST_MODE is on: /test/reset is live");
    }
    log::info!("Lumen-Gallery starting on http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .service(actix_files::Files::new(&url_prefix, &upload_dir))
            .configure(lg_api::configure_routes)
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
