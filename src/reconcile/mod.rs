//! Declarative alert-policy reconciliation
//!
//! Given a desired set of [`AlertPolicyDefinition`]s and
//! [`NotificationChannelDefinition`]s, the reconciler ensures each exists in
//! the remote monitoring service with matching configuration, creating or
//! updating idempotently. Typically run as a setup/maintenance step,
//! independent of metric dispatch.

mod definitions;
mod reconciler;

pub use definitions::{
    AlertPolicyDefinition, ConditionDefinition, NotificationChannelDefinition,
};
pub use reconciler::{
    AlertPolicyReconciler, PolicyOutcome, ReconcileEntry, ReconcileError, ReconcileReport,
};
