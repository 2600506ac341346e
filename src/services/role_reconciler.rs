//! Keeps the designated admin account's role consistent.
//!
//! Reconciliation reads the identity provider and the profile table, plans the
//! minimal corrective writes, and applies them. Every step compares current
//! and desired state first, so repeated runs converge without extra writes.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RolesConfig;
use crate::database::{Profile, ProfileStore, ProfileStoreError};
use crate::identity::{Account, IdentityError, IdentityStore};
use crate::types::Role;

/// A corrective write the reconciler intends to make
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleWrite {
    ProfileRole { account_id: Uuid, role: Role },
    MetadataRoleHint { account_id: Uuid, role: Role },
}

/// Non-fatal observations made while reconciling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// The account exists but signup never produced a profile row
    ProfileMissing { account_id: Uuid },
    /// The metadata mirror failed; the profile row is still authoritative
    MetadataWriteFailed { account_id: Uuid, message: String },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to list accounts: {0}")]
    IdentityFetch(#[source] IdentityError),

    #[error("failed to read profile {account_id}: {source}")]
    ProfileRead {
        account_id: Uuid,
        #[source]
        source: ProfileStoreError,
    },

    #[error("failed to update profile role for {account_id}: {source}")]
    ProfileWrite {
        account_id: Uuid,
        #[source]
        source: ProfileStoreError,
    },
}

/// What reconciliation would do right now, computed without writing
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilePlan {
    pub admin_email: String,
    pub account_found: bool,
    pub account_id: Option<Uuid>,
    pub profile_role: Option<String>,
    pub metadata_role: Option<String>,
    pub pending: Vec<RoleWrite>,
    pub findings: Vec<Finding>,
}

impl ReconcilePlan {
    fn vacant(admin_email: &str) -> Self {
        Self {
            admin_email: admin_email.to_string(),
            account_found: false,
            account_id: None,
            profile_role: None,
            metadata_role: None,
            pending: Vec::new(),
            findings: Vec::new(),
        }
    }

    pub fn is_converged(&self) -> bool {
        self.pending.is_empty()
    }
}

/// What a reconciliation run actually did
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub account_id: Option<Uuid>,
    pub profile_updated: bool,
    pub metadata_updated: bool,
    pub findings: Vec<Finding>,
}

impl ReconcileReport {
    pub fn profile_missing(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f, Finding::ProfileMissing { .. }))
    }

    /// Human-readable summary used as the outcome message
    pub fn summary(&self, admin_email: &str) -> String {
        if self.account_id.is_none() {
            return format!("No account registered for {}; nothing to reconcile", admin_email);
        }

        let mut message = if self.profile_updated {
            format!("Granted admin role to {}", admin_email)
        } else if self.profile_missing() {
            format!("Profile row missing for {}; role update skipped", admin_email)
        } else {
            format!("{} already holds the admin role", admin_email)
        };

        if self.metadata_updated {
            message.push_str("; metadata role hint synced");
        }

        for finding in &self.findings {
            if let Finding::MetadataWriteFailed { message: reason, .. } = finding {
                message.push_str(&format!("; metadata role hint update failed: {}", reason));
            }
        }

        message
    }
}

/// Boundary result of a reconciliation run. Store errors never escape as
/// values; they are folded into `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub success: bool,
    pub message: String,
}

/// Locate the designated account. Email comparison is exact.
pub fn find_designated<'a>(accounts: &'a [Account], admin_email: &str) -> Option<&'a Account> {
    accounts.iter().find(|account| account.has_email(admin_email))
}

/// Compute the writes needed to make `account` an admin. The profile write,
/// when present, always precedes the metadata write.
///
/// A hint that is present and not `admin` is always corrected so both stores
/// agree; `mirror_metadata` only decides whether a missing hint gets written.
pub fn plan_writes(
    account: &Account,
    profile: Option<&Profile>,
    mirror_metadata: bool,
) -> (Vec<RoleWrite>, Vec<Finding>) {
    let mut writes = Vec::new();
    let mut findings = Vec::new();

    match profile {
        None => findings.push(Finding::ProfileMissing { account_id: account.id }),
        Some(profile) if !profile.has_role(Role::Admin) => writes.push(RoleWrite::ProfileRole {
            account_id: account.id,
            role: Role::Admin,
        }),
        Some(_) => {}
    }

    let hint_is_admin = account
        .role_hint
        .as_deref()
        .is_some_and(|hint| Role::Admin.matches(hint));
    let hint_present = account.role_hint.is_some();
    if !hint_is_admin && (hint_present || mirror_metadata) {
        writes.push(RoleWrite::MetadataRoleHint {
            account_id: account.id,
            role: Role::Admin,
        });
    }

    (writes, findings)
}

pub struct RoleReconciler {
    identity: Arc<dyn IdentityStore>,
    profiles: Arc<dyn ProfileStore>,
    admin_email: String,
    mirror_metadata: bool,
}

impl RoleReconciler {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        roles: &RolesConfig,
    ) -> Self {
        Self {
            identity,
            profiles,
            admin_email: roles.admin_email.clone(),
            mirror_metadata: roles.mirror_metadata,
        }
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Read both stores and compute pending writes. Never writes.
    pub async fn plan(&self) -> Result<ReconcilePlan, ReconcileError> {
        let accounts = self
            .identity
            .list_accounts()
            .await
            .map_err(ReconcileError::IdentityFetch)?;

        let Some(account) = find_designated(&accounts, &self.admin_email) else {
            return Ok(ReconcilePlan::vacant(&self.admin_email));
        };

        let profile = self
            .profiles
            .find_by_id(account.id)
            .await
            .map_err(|source| ReconcileError::ProfileRead {
                account_id: account.id,
                source,
            })?;

        let (pending, findings) = plan_writes(account, profile.as_ref(), self.mirror_metadata);

        Ok(ReconcilePlan {
            admin_email: self.admin_email.clone(),
            account_found: true,
            account_id: Some(account.id),
            profile_role: profile.map(|p| p.role),
            metadata_role: account.role_hint.clone(),
            pending,
            findings,
        })
    }

    /// Plan, then apply the pending writes in order.
    pub async fn apply(&self) -> Result<ReconcileReport, ReconcileError> {
        let plan = self.plan().await?;

        let Some(account_id) = plan.account_id else {
            info!("No account for designated admin {}; nothing to reconcile", self.admin_email);
            return Ok(ReconcileReport::default());
        };

        let mut report = ReconcileReport {
            account_id: Some(account_id),
            findings: plan.findings,
            ..Default::default()
        };

        if report.profile_missing() {
            warn!("Profile row missing for designated admin {} ({})", self.admin_email, account_id);
        }
        if plan.pending.is_empty() {
            debug!("Designated admin {} already consistent", self.admin_email);
        }

        for write in plan.pending {
            match write {
                RoleWrite::ProfileRole { account_id, role } => {
                    self.profiles
                        .update_role(account_id, role, Utc::now())
                        .await
                        .map_err(|source| ReconcileError::ProfileWrite { account_id, source })?;
                    info!("Set profile role '{}' for {} ({})", role, self.admin_email, account_id);
                    report.profile_updated = true;
                }
                RoleWrite::MetadataRoleHint { account_id, role } => {
                    match self.identity.update_role_hint(account_id, role).await {
                        Ok(()) => {
                            info!("Mirrored role '{}' into metadata for {}", role, account_id);
                            report.metadata_updated = true;
                        }
                        Err(e) => {
                            warn!("Metadata role hint update failed for {}: {}", account_id, e);
                            report.findings.push(Finding::MetadataWriteFailed {
                                account_id,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// Run reconciliation to completion and fold the result into an outcome
    pub async fn reconcile(&self) -> ReconcileOutcome {
        match self.apply().await {
            Ok(report) => ReconcileOutcome {
                success: true,
                message: report.summary(&self.admin_email),
            },
            Err(e) => {
                error!("Role reconciliation failed: {}", e);
                ReconcileOutcome {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }
}
