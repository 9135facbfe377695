//! API Routes
//!
//! - `/api/health` - Health check
//! - `/api/process-document` - Multipart upload of a single document
//! - `/api/process-all` - Batch run over the configured input directory
//! - `/api/test-email`, `/api/send-email` - Admin dashboard email

pub mod health;
pub mod notify;
pub mod process;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(health::router(state.clone()))
        .merge(process::router(state.clone()))
        .merge(notify::router(state));

    apply_cors(api_router, &origins).layer(TraceLayer::new_for_http())
}
