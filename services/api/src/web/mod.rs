pub mod page;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use page::{analyze_page, index_page};
pub use rest::{analyze_handler, download_report_handler, health_handler, ApiDoc};
pub use state::AppState;

/// Builds the complete application router: HTML page, JSON API, report downloads
/// and the Swagger UI.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // No default upload limit is imposed unless one is configured.
    let body_limit = match app_state.config.max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app_router = Router::new()
        .route("/", get(index_page).post(analyze_page))
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/reports/{file_name}", get(download_report_handler))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new()
        .merge(app_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
