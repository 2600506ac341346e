use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::{config, BootstrapConfig};
use crate::database::{DatabaseManager, PgProfileStore};
use crate::identity::HttpIdentityStore;
use crate::services::{BootstrapResult, BootstrapTrigger, Finding, RoleReconciler, RoleWrite};

/// Build a reconciler over the stores named by the environment
async fn reconciler_from_env() -> anyhow::Result<RoleReconciler> {
    let config = config();
    let identity = HttpIdentityStore::new(&config.identity)
        .context("failed to configure identity provider client")?;
    let profiles = PgProfileStore::from_config(&config.database)
        .await
        .context("failed to configure profile store")?;

    Ok(RoleReconciler::new(
        Arc::new(identity),
        Arc::new(profiles),
        &config.roles,
    ))
}

pub async fn ensure_admin(
    url: &str,
    fallback: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let settings = BootstrapConfig {
        enabled: true,
        delay_ms: 0,
        endpoint: config().bootstrap.endpoint.clone(),
        fallback_endpoint: fallback.or_else(|| config().bootstrap.fallback_endpoint.clone()),
    };

    let trigger = BootstrapTrigger::new(url, &settings);
    let handle = trigger
        .fire()
        .context("bootstrap trigger already fired")?;
    let result = handle.await.context("bootstrap task panicked")?;

    match result {
        BootstrapResult::Reconciled { message } => output_success(&output_format, &message, None),
        BootstrapResult::ReconciledByFallback { message } => output_success(
            &output_format,
            &message,
            Some(json!({ "via_fallback": true })),
        ),
        BootstrapResult::Failed { reason } => {
            output_error(&output_format, &reason)?;
            anyhow::bail!("admin bootstrap failed")
        }
    }
}

pub async fn reconcile(output_format: OutputFormat) -> anyhow::Result<()> {
    let reconciler = reconciler_from_env().await?;
    let result = reconciler.apply().await;
    DatabaseManager::close().await;

    match result {
        Ok(report) => {
            let message = report.summary(reconciler.admin_email());
            output_success(&output_format, &message, Some(serde_json::to_value(&report)?))
        }
        Err(e) => {
            output_error(&output_format, &e.to_string())?;
            Err(e.into())
        }
    }
}

pub async fn plan(output_format: OutputFormat) -> anyhow::Result<()> {
    let reconciler = reconciler_from_env().await?;
    let result = reconciler.plan().await;
    DatabaseManager::close().await;

    let plan = match result {
        Ok(plan) => plan,
        Err(e) => {
            output_error(&output_format, &e.to_string())?;
            return Err(e.into());
        }
    };

    let headline = if !plan.account_found {
        format!("No account registered for {}", plan.admin_email)
    } else if plan.is_converged() {
        format!("{} is consistent; nothing to write", plan.admin_email)
    } else {
        format!("{} pending write(s) for {}", plan.pending.len(), plan.admin_email)
    };

    let mut lines: Vec<String> = plan.pending.iter().map(describe_write).collect();
    lines.extend(plan.findings.iter().map(describe_finding));

    output_success(&output_format, &headline, Some(serde_json::to_value(&plan)?))?;
    output_details(&output_format, &lines);
    Ok(())
}

fn describe_write(write: &RoleWrite) -> String {
    match write {
        RoleWrite::ProfileRole { account_id, role } => {
            format!("set profiles.role = '{}' for {}", role, account_id)
        }
        RoleWrite::MetadataRoleHint { account_id, role } => {
            format!("set user_metadata.role = '{}' for {}", role, account_id)
        }
    }
}

fn describe_finding(finding: &Finding) -> String {
    match finding {
        Finding::ProfileMissing { account_id } => format!("profile row missing for {}", account_id),
        Finding::MetadataWriteFailed { account_id, message } => {
            format!("metadata write failed for {}: {}", account_id, message)
        }
    }
}
