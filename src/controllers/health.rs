use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::storage::{bytes_to_gb, StorageManager};
use crate::infrastructure::db::{check_connection, DbPool};

/// What the readiness check looks at
pub struct HealthState {
    pub pool: Option<Arc<DbPool>>,
    pub storage: Arc<StorageManager>,
    pub quota_bytes: u64,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = match &state.pool {
        None => "in_memory",
        Some(pool) => match check_connection(pool).await {
            Ok(_) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check failed to reach the database");
                "disconnected"
            }
        },
    };

    let usage = state.storage.current_usage().await;
    let body = json!({
        "status": if database == "disconnected" { "not_ready" } else { "ready" },
        "database": database,
        "storage": {
            "used_gb": bytes_to_gb(usage),
            "quota_gb": bytes_to_gb(state.quota_bytes),
        }
    });

    let status = if database == "disconnected" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(body))
}
