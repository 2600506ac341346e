pub mod bootstrap;
pub mod role_reconciler;

pub use bootstrap::{BootstrapResult, BootstrapTrigger, TriggerState};
pub use role_reconciler::{
    Finding, ReconcileError, ReconcileOutcome, ReconcilePlan, ReconcileReport, RoleReconciler,
    RoleWrite,
};
