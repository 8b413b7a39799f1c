pub mod request_id;

pub use request_id::request_id_middleware;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::controllers::{
    conversion::ConversionController,
    health::{self, HealthState},
    history::HistoryController,
};
use crate::infrastructure::config::Config;

/// Everything the router needs to serve requests
pub struct Controllers {
    pub health: Arc<HealthState>,
    pub conversion: Arc<ConversionController>,
    pub history: Arc<HistoryController>,
}

/// Build the application router with all routes configured
pub fn create_router(controllers: Controllers, max_upload_bytes: usize) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(controllers.health);

    let conversion_routes = Router::new()
        .route("/api/voices", get(ConversionController::voices))
        .route("/api/convert", post(ConversionController::convert))
        .route("/api/convert/upload", post(ConversionController::convert_upload))
        .route("/api/status/:job_id", get(ConversionController::status))
        .route("/api/cancel/:job_id", post(ConversionController::cancel))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(controllers.conversion);

    let history_routes = Router::new()
        .route("/api/history", get(HistoryController::list))
        .route(
            "/api/history/:id",
            get(HistoryController::get).delete(HistoryController::delete),
        )
        .route("/api/result/:id", get(HistoryController::result))
        .route("/api/audio/:id", get(HistoryController::audio))
        .with_state(controllers.history);

    Router::new()
        .merge(health_routes)
        .merge(conversion_routes)
        .merge(history_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` until the process is stopped
pub async fn start_http_server(
    config: Arc<Config>,
    router: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;

    Ok(())
}
