// handlers/public/ensure_admin.rs - GET /ensure-admin handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::AppState;
use crate::services::ReconcileOutcome;

/// Response body for the reconciliation endpoint
#[derive(Debug, Serialize)]
pub struct EnsureAdminResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ReconcileOutcome> for EnsureAdminResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            timestamp: Utc::now(),
        }
    }
}

/// GET /ensure-admin - Make sure the designated admin account holds the admin role
///
/// Runs one reconciliation to completion within the request.
///
/// Expected Output:
/// ```json
/// { "success": true, "message": "Granted admin role to admin@example.com", "timestamp": "2024-05-01T12:00:00Z" }
/// ```
///
/// `500` with `success: false` when the account listing, the profile read,
/// or the profile write fails.
pub async fn ensure_admin(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.reconciler.reconcile().await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(EnsureAdminResponse::from(outcome)))
}
