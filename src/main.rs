//! Memory Site Backend
//!
//! Serves the content document and media uploads for a personal memory site and its admin panel.

mod api;
mod auth;
mod config;
mod errors;
mod media;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use media::{MediaDirs, MediaPipeline};
use store::ContentStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub media: Arc<MediaPipeline>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Memory Site Backend");
    tracing::info!("Content file: {:?}", config.content_path);
    tracing::info!("Uploads directory: {:?}", config.uploads_dir);
    tracing::info!("Upload size limit: {} bytes per file", config.upload_max_size);

    if config.admin_psk.is_none() {
        tracing::warn!("No admin PSK configured (ADMIN_PSK). Admin routes are open!");
    }

    let state = build_state(config.clone()).await?;
    tracing::debug!("Media directories: {:?}", state.media.dirs());

    // Make sure the document exists before the first visitor arrives
    let content = state.store.read().await?;
    tracing::info!(
        "Content loaded with {} photos and {} timeline events",
        content.photos.len(),
        content.timeline.len()
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);
    tracing::info!("Visit http://{}/api/content for the content document", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the store and media directories described by `config`.
pub async fn build_state(config: Config) -> Result<AppState, errors::AppError> {
    let store = Arc::new(store::init_store(&config.content_path).await?);

    let dirs = MediaDirs::new(&config.uploads_dir);
    dirs.ensure().await?;
    let media = Arc::new(MediaPipeline::new(dirs, store.clone()));

    Ok(AppState {
        store,
        media,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.admin_psk.clone();
    let admin_auth =
        middleware::from_fn(move |req, next| auth::admin_auth_layer(psk.clone(), req, next));

    let upload_routes = Router::new()
        .route("/upload/photos", post(api::upload_photos))
        .route("/upload/video", post(api::upload_video))
        .route("/upload/timeline", post(api::upload_timeline_image))
        .route("/upload/timeline-video", post(api::upload_timeline_video))
        .layer(DefaultBodyLimit::max(state.config.upload_request_limit()));

    let admin_routes = Router::new()
        .route("/api/photos", delete(api::clear_photos))
        .route("/api/photos/{filename}", delete(api::delete_photo))
        .route("/api/video", delete(api::remove_video))
        .route("/api/color-presets/{name}", post(api::apply_color_preset))
        .merge(upload_routes)
        .route_layer(admin_auth.clone());

    // Reads are public; only the POST on /api/content needs the admin key
    let public_routes = Router::new()
        .route(
            "/api/content",
            get(api::get_content).merge(post(api::replace_content).route_layer(admin_auth)),
        )
        .route("/api/color-presets", get(api::list_color_presets))
        .route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
