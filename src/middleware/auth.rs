use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::Role;

/// Authenticated admin context extracted from the access token
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<Claims> for AdminUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// Validates the bearer token, then requires the subject's profile row to
/// hold the admin role. Token claims alone never grant admin.
pub async fn require_admin_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.jwt.secret, &state.jwt.audience)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let profile = state.profiles.find_by_id(claims.sub).await.map_err(|e| {
        tracing::error!("Profile lookup failed for {}: {}", claims.sub, e);
        ApiError::internal_server_error("Failed to validate user")
    })?;

    match profile {
        Some(profile) if profile.has_role(Role::Admin) => {}
        Some(_) => {
            tracing::warn!("Non-admin account {} requested an admin route", claims.sub);
            return Err(ApiError::forbidden("Admin role required"));
        }
        None => {
            tracing::warn!("Account {} has no profile row", claims.sub);
            return Err(ApiError::forbidden("Admin role required"));
        }
    }

    request.extensions_mut().insert(AdminUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
