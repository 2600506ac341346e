//! Fire-once caller of the reconciliation endpoint.
//!
//! A trigger moves `NotRun -> Running -> Done` exactly once. Firing never
//! blocks the caller, and failures end up in the log, never in a panic or a
//! returned error.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::BootstrapConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerState {
    NotRun = 0,
    Running = 1,
    Done = 2,
}

impl TriggerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TriggerState::NotRun,
            1 => TriggerState::Running,
            _ => TriggerState::Done,
        }
    }
}

/// How a fired trigger ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapResult {
    /// The primary endpoint answered with success
    Reconciled { message: String },
    /// The primary endpoint failed; the fallback answered with success
    ReconciledByFallback { message: String },
    /// Nothing succeeded; already logged
    Failed { reason: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
}

pub struct BootstrapTrigger {
    client: Client,
    base_url: String,
    endpoint: String,
    fallback_endpoint: Option<String>,
    delay: Duration,
    state: Arc<AtomicU8>,
}

impl BootstrapTrigger {
    pub fn new(base_url: &str, settings: &BootstrapConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: settings.endpoint.clone(),
            fallback_endpoint: settings.fallback_endpoint.clone(),
            delay: Duration::from_millis(settings.delay_ms),
            state: Arc::new(AtomicU8::new(TriggerState::NotRun as u8)),
        }
    }

    pub fn state(&self) -> TriggerState {
        TriggerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Start the bootstrap in the background. Only the first call on a
    /// trigger spawns work; later calls return `None`.
    pub fn fire(&self) -> Option<JoinHandle<BootstrapResult>> {
        self.state
            .compare_exchange(
                TriggerState::NotRun as u8,
                TriggerState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok()?;

        let client = self.client.clone();
        let primary = self.url_for(&self.endpoint);
        let fallback = self.fallback_endpoint.as_deref().map(|e| self.url_for(e));
        let delay = self.delay;
        let state = self.state.clone();

        Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = run(&client, &primary, fallback.as_deref()).await;
            state.store(TriggerState::Done as u8, Ordering::SeqCst);
            result
        }))
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

async fn run(client: &Client, primary: &str, fallback: Option<&str>) -> BootstrapResult {
    let primary_error = match call(client, primary).await {
        Ok(message) => {
            info!("Admin bootstrap succeeded: {}", message);
            return BootstrapResult::Reconciled { message };
        }
        Err(reason) => reason,
    };

    let Some(fallback) = fallback else {
        warn!("Admin bootstrap failed: {}", primary_error);
        return BootstrapResult::Failed { reason: primary_error };
    };

    warn!("Admin bootstrap failed ({}), trying fallback {}", primary_error, fallback);
    match call(client, fallback).await {
        Ok(message) => {
            info!("Admin bootstrap fallback succeeded: {}", message);
            BootstrapResult::ReconciledByFallback { message }
        }
        Err(reason) => {
            warn!("Admin bootstrap fallback failed: {}", reason);
            BootstrapResult::Failed {
                reason: format!("{}; fallback: {}", primary_error, reason),
            }
        }
    }
}

/// GET one endpoint; Ok carries the envelope message
async fn call(client: &Client, url: &str) -> Result<String, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request to {} failed: {}", url, e))?;

    let status = response.status();
    let envelope = response.json::<Envelope>().await.ok();

    match envelope {
        Some(body) if status.is_success() && body.success => Ok(body.message),
        Some(body) if !body.message.is_empty() => {
            Err(format!("{} returned {}: {}", url, status.as_u16(), body.message))
        }
        _ => Err(format!("{} returned {}", url, status.as_u16())),
    }
}
