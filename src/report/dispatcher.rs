use super::{ReportError, ReportingBackend};
use crate::metrics::MetricsRegistry;

/// Fans a run's registries out to every configured backend
///
/// Backends are independent destinations: a remote outage must not suppress
/// the local audit log, so every backend is attempted and the failures are
/// reported together afterwards.
#[derive(Default)]
pub struct MetricsDispatcher {
    backends: Vec<ReportingBackend>,
    registries: Vec<MetricsRegistry>,
}

impl MetricsDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: impl Into<ReportingBackend>) -> Self {
        self.backends.push(backend.into());
        self
    }

    pub fn add_backend(&mut self, backend: impl Into<ReportingBackend>) {
        self.backends.push(backend.into());
    }

    /// Queue a finished registry for the next [`flush`](Self::flush)
    pub fn add_registry(&mut self, registry: MetricsRegistry) {
        self.registries.push(registry);
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Dispatch one registry through every backend: validate, prepare, send
    ///
    /// Backends run in configured order; a failure in one never prevents
    /// dispatch to the next. All failures come back in one aggregate error
    /// that also names the backends that succeeded.
    pub async fn send_all(
        &self,
        registry: &mut MetricsRegistry,
    ) -> Result<(), AggregateDispatchError> {
        let mut failures = Vec::new();
        let mut succeeded = Vec::new();

        for backend in &self.backends {
            match Self::dispatch_one(backend, registry).await {
                Ok(()) => succeeded.push(backend.name().to_string()),
                Err(error) => {
                    tracing::error!(
                        backend = backend.name(),
                        run = registry.run_name(),
                        %error,
                        "backend dispatch failed"
                    );
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateDispatchError { failures, succeeded })
        }
    }

    /// Drain the queued registries through [`send_all`](Self::send_all)
    pub async fn flush(&mut self) -> Result<(), AggregateDispatchError> {
        let mut registries = std::mem::take(&mut self.registries);
        let mut failures = Vec::new();
        let mut succeeded = Vec::new();

        for registry in registries.iter_mut() {
            match self.send_all(registry).await {
                Ok(()) => {}
                Err(aggregate) => {
                    failures.extend(aggregate.failures);
                    succeeded.extend(aggregate.succeeded);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateDispatchError { failures, succeeded })
        }
    }

    async fn dispatch_one(
        backend: &ReportingBackend,
        registry: &mut MetricsRegistry,
    ) -> Result<(), ReportError> {
        backend.validate(registry)?;
        backend.prepare(registry)?;
        backend.send(registry).await
    }
}

/// One backend's failure within a dispatch
#[derive(Debug)]
pub struct BackendFailure {
    pub backend: String,
    pub error: ReportError,
}

/// One-or-more backend failures from a single dispatch
#[derive(Debug, thiserror::Error)]
#[error("{} backend(s) failed: {}", .failures.len(), summarize(.failures))]
pub struct AggregateDispatchError {
    pub failures: Vec<BackendFailure>,
    /// Backends that completed their send despite the failures
    pub succeeded: Vec<String>,
}

impl AggregateDispatchError {
    pub fn failed_backends(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.backend.as_str()).collect()
    }
}

fn summarize(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.backend, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}
