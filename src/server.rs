use std::sync::Arc;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, RolesConfig};
use crate::database::ProfileStore;
use crate::handlers::{elevated, public};
use crate::identity::IdentityStore;
use crate::middleware::require_admin_middleware;
use crate::services::RoleReconciler;

/// Access-token settings shared with the admin middleware
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub audience: String,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<RoleReconciler>,
    pub profiles: Arc<dyn ProfileStore>,
    pub jwt: Arc<JwtSettings>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        config: &AppConfig,
    ) -> Self {
        let jwt = JwtSettings {
            secret: config.security.jwt_secret.clone(),
            audience: config.security.jwt_audience.clone(),
        };
        Self::with_settings(identity, profiles, &config.roles, jwt)
    }

    pub fn with_settings(
        identity: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        roles: &RolesConfig,
        jwt: JwtSettings,
    ) -> Self {
        let reconciler = RoleReconciler::new(identity, profiles.clone(), roles);
        Self {
            reconciler: Arc::new(reconciler),
            profiles,
            jwt: Arc::new(jwt),
        }
    }
}

pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Reconciliation entry point (no parameters, fixed admin email)
        .route("/ensure-admin", get(public::ensure_admin))
        // Admin-only
        .merge(elevated_routes(state.clone()))
        .fallback(public::not_found)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/roles/status", get(elevated::roles::status))
        .route_layer(middleware::from_fn_with_state(state, require_admin_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
