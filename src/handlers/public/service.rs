// handlers/public/service.rs - service index, health and fallback

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::server::AppState;

pub async fn root() -> ApiResponse<Value> {
    let version = env!("CARGO_PKG_VERSION");

    ApiResponse::success(json!({
        "name": "Subtrack API",
        "version": version,
        "description": "Role consistency service for the subcontractor dashboard",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "ensure_admin": "/ensure-admin (public - idempotent role reconciliation)",
            "roles": "/api/roles/status (admin - dry-run reconciliation plan)",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.profiles.ping().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "profiles": "ok"
        })),
        Err(e) => {
            tracing::warn!("Health check: profile store unavailable: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "profiles": "unavailable"
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
