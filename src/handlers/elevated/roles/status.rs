// handlers/elevated/roles/status.rs - GET /api/roles/status handler

use axum::{extract::State, Extension};

use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::ReconcilePlan;

/// GET /api/roles/status - Report what `/ensure-admin` would change, without writing
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "admin_email": "admin@example.com",
///     "account_found": true,
///     "account_id": "…",
///     "profile_role": "subcontractor",
///     "metadata_role": null,
///     "pending": [
///       { "kind": "profile_role", "account_id": "…", "role": "admin" },
///       { "kind": "metadata_role_hint", "account_id": "…", "role": "admin" }
///     ],
///     "findings": []
///   }
/// }
/// ```
pub async fn status(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
) -> ApiResult<ReconcilePlan> {
    tracing::debug!(
        "Role status requested by {} ({})",
        admin.email.as_deref().unwrap_or("no email"),
        admin.id
    );

    let plan = state.reconciler.plan().await?;
    Ok(ApiResponse::success(plan))
}
