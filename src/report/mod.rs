//! Reporting backends and multi-backend dispatch
//!
//! A backend is a self-contained strategy with the capability set
//! validate / prepare / send. The two variants share no mutable state; the
//! dispatcher fans one registry out to every configured backend and reports
//! all failures together.

mod dispatcher;
mod local;
mod remote;

pub use dispatcher::{AggregateDispatchError, BackendFailure, MetricsDispatcher};
pub use local::LocalBackend;
pub use remote::{RemoteConfig, RemoteMonitoringBackend, DEFAULT_BATCH_SIZE, SUPPORTED_UNITS};

use crate::metrics::MetricsRegistry;
use crate::monitoring::RemoteError;

/// Which backend family a prepared form belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Remote => write!(f, "remote"),
        }
    }
}

/// A reporting destination for a run's metrics
///
/// Sealed variant set: each backend holds only its client/sink handle and
/// keeps no metric state between calls beyond what is passed in.
pub enum ReportingBackend {
    Local(LocalBackend),
    Remote(RemoteMonitoringBackend),
}

impl ReportingBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            ReportingBackend::Local(_) => BackendKind::Local,
            ReportingBackend::Remote(_) => BackendKind::Remote,
        }
    }

    /// Stable name used in dispatch reports
    pub fn name(&self) -> &'static str {
        match self {
            ReportingBackend::Local(_) => "local",
            ReportingBackend::Remote(_) => "remote",
        }
    }

    /// Check the registry against the backend's schema constraints
    pub fn validate(&self, registry: &MetricsRegistry) -> Result<(), ReportError> {
        match self {
            ReportingBackend::Local(backend) => backend.validate(registry),
            ReportingBackend::Remote(backend) => backend.validate(registry),
        }
    }

    /// Build the backend-specific prepared forms and store them on the registry
    ///
    /// A recompute is skipped when the registry is already prepared for this
    /// backend's kind; a prepared set from a different kind is replaced.
    pub fn prepare(&self, registry: &mut MetricsRegistry) -> Result<(), ReportError> {
        match self {
            ReportingBackend::Local(backend) => backend.prepare(registry),
            ReportingBackend::Remote(backend) => backend.prepare(registry),
        }
    }

    /// Deliver the registry's prepared forms to the backend's destination
    pub async fn send(&self, registry: &MetricsRegistry) -> Result<(), ReportError> {
        match self {
            ReportingBackend::Local(backend) => backend.send(registry),
            ReportingBackend::Remote(backend) => backend.send(registry).await,
        }
    }
}

impl From<LocalBackend> for ReportingBackend {
    fn from(backend: LocalBackend) -> Self {
        ReportingBackend::Local(backend)
    }
}

impl From<RemoteMonitoringBackend> for ReportingBackend {
    fn from(backend: RemoteMonitoringBackend) -> Self {
        ReportingBackend::Remote(backend)
    }
}

/// Backend reporting errors
///
/// `InvalidMetric` is a validation failure: raised before any send and never
/// retried automatically. The remaining variants are transport failures the
/// caller may retry with backoff; a retried remote write is at-least-once.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    #[error("registry `{registry}` has no prepared forms for the {kind} backend")]
    NotPrepared { registry: String, kind: BackendKind },

    #[error("failed to write metrics sink: {0}")]
    SinkWrite(#[from] std::io::Error),

    /// A batch was rejected; indices are relative to the registry's
    /// iteration order. Already-accepted batches are not retried.
    #[error("remote write rejected {} point(s): {message}", .rejected.len())]
    RemoteWrite { rejected: Vec<usize>, message: String },

    #[error("remote write timed out")]
    RemoteTimeout,

    #[error(transparent)]
    Remote(RemoteError),
}
