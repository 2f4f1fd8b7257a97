//! Runmetrics: run metrics reporting and alert-policy reconciliation
//!
//! A run collects typed measurements into a [`MetricsRegistry`], then hands
//! it to a [`MetricsDispatcher`] that validates, prepares and sends it
//! through every configured reporting backend: a local line-oriented JSON
//! sink and a remote monitoring service. A companion
//! [`AlertPolicyReconciler`] ensures a declared set of alert policies and
//! notification channels exists in the remote service, idempotently.
//!
//! # Features
//!
//! - **Typed metrics**: int, float and string values with per-registry
//!   unique names and insertion-order iteration
//! - **Multi-backend fan-out**: every backend is attempted; failures are
//!   aggregated, never suppressed by another backend's outage
//! - **Batched remote writes**: time-series points chunked per the remote
//!   API's per-call limit, with caller-controlled retry
//! - **Declarative alerting**: create/update/unchanged reconciliation of
//!   alert policies and notification channels against live remote state
//!
//! # Example
//!
//! ```no_run
//! use runmetrics::{LocalBackend, MetricsDispatcher, MetricsRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = MetricsRegistry::new("deploy");
//! registry.add_metric("time", 123.34, "seconds")?;
//! registry.add_metric("successful", 1, "hours")?;
//!
//! let dispatcher = MetricsDispatcher::new()
//!     .with_backend(LocalBackend::new("/var/log/run_metrics.log"));
//! dispatcher.send_all(&mut registry).await?;
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod monitoring;
pub mod reconcile;
pub mod report;

// Re-export commonly used types
pub use metrics::{Metric, MetricError, MetricValue, MetricsRegistry, TypeTag};
pub use monitoring::{HttpMonitoringClient, MonitoringClient, RemoteError};
pub use reconcile::{
    AlertPolicyDefinition, AlertPolicyReconciler, ConditionDefinition,
    NotificationChannelDefinition, PolicyOutcome, ReconcileReport,
};
pub use report::{
    AggregateDispatchError, LocalBackend, MetricsDispatcher, RemoteConfig,
    RemoteMonitoringBackend, ReportError, ReportingBackend,
};
