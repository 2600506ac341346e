#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use uuid::Uuid;

use subtrack_api::auth::{generate_jwt, Claims};
use subtrack_api::config::RolesConfig;
use subtrack_api::server::{self, AppState, JwtSettings};
use subtrack_api::testing::{MemoryIdentityStore, MemoryProfileStore};

pub use subtrack_api::testing::{account, profile};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const JWT_SECRET: &str = "integration-test-secret-with-enough-length";
pub const JWT_AUDIENCE: &str = "authenticated";

/// In-process server over in-memory stores, on its own port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub identity: Arc<MemoryIdentityStore>,
    pub profiles: Arc<MemoryProfileStore>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(identity: MemoryIdentityStore, profiles: MemoryProfileStore) -> Result<Self> {
        let identity = Arc::new(identity);
        let profiles = Arc::new(profiles);

        let roles = RolesConfig {
            admin_email: ADMIN_EMAIL.to_string(),
            mirror_metadata: true,
        };
        let jwt = JwtSettings {
            secret: JWT_SECRET.to_string(),
            audience: JWT_AUDIENCE.to_string(),
        };
        let state = AppState::with_settings(identity.clone(), profiles.clone(), &roles, jwt);
        let app = server::app(state, &[]);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("test server stopped: {}", e);
            }
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            identity,
            profiles,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn access_token(account_id: Uuid, email: &str) -> String {
    let claims = Claims::new(account_id, Some(email.to_string()), JWT_AUDIENCE, 1);
    generate_jwt(&claims, JWT_SECRET).expect("token")
}
