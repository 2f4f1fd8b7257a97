use std::collections::HashMap;
use std::sync::Arc;

use super::{BackendKind, ReportError};
use crate::metrics::{MetricValue, MetricsRegistry, PreparedRecord, PreparedSet};
use crate::monitoring::{MonitoringClient, PointValue, RemoteError, TimeSeriesPoint};

/// Maximum points per write-time-series call unless overridden
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Units the remote monitoring service accepts
pub const SUPPORTED_UNITS: &[&str] = &[
    "seconds",
    "milliseconds",
    "minutes",
    "hours",
    "count",
    "bytes",
    "percent",
];

/// Remote backend configuration, passed explicitly at construction
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub project_id: String,
    /// Points per write call; the remote API has a per-call limit
    pub batch_size: usize,
}

impl RemoteConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Remote monitoring service backend: metrics become time-series points
pub struct RemoteMonitoringBackend {
    client: Arc<dyn MonitoringClient>,
    config: RemoteConfig,
}

impl RemoteMonitoringBackend {
    pub fn new(client: Arc<dyn MonitoringClient>, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    /// Reject units outside the service whitelist and non-finite numbers
    pub fn validate(&self, registry: &MetricsRegistry) -> Result<(), ReportError> {
        for metric in registry.metrics() {
            if !SUPPORTED_UNITS.contains(&metric.unit()) {
                return Err(ReportError::InvalidMetric(format!(
                    "metric `{}` has unsupported unit `{}`",
                    metric.name(),
                    metric.unit()
                )));
            }
            if let MetricValue::Float(v) = metric.value() {
                if !v.is_finite() {
                    return Err(ReportError::InvalidMetric(format!(
                        "metric `{}` has non-finite value {}",
                        metric.name(),
                        v
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn prepare(&self, registry: &mut MetricsRegistry) -> Result<(), ReportError> {
        if registry.is_prepared_for(BackendKind::Remote) {
            return Ok(());
        }

        let now = chrono::Utc::now();
        let mut records = Vec::with_capacity(registry.len());
        for metric in registry.metrics() {
            let point = TimeSeriesPoint {
                metric_type: format!(
                    "custom.googleapis.com/{}/{}",
                    registry.run_name(),
                    metric.name()
                ),
                resource_type: "global".to_string(),
                resource_labels: HashMap::from([(
                    "project_id".to_string(),
                    self.config.project_id.clone(),
                )]),
                value: match metric.value() {
                    MetricValue::Int(v) => PointValue::Int64Value(*v),
                    MetricValue::Float(v) => PointValue::DoubleValue(*v),
                    MetricValue::Str(s) => PointValue::StringValue(s.clone()),
                },
                end_time: now,
            };
            records.push((metric.name().to_string(), PreparedRecord::Point(point)));
        }

        registry.set_prepared(PreparedSet::new(BackendKind::Remote, records));
        Ok(())
    }

    /// Write the prepared points in batches of `batch_size`
    ///
    /// Batches already accepted by the remote service are not retried when a
    /// later batch fails; whole-send retry is the caller's decision.
    pub async fn send(&self, registry: &MetricsRegistry) -> Result<(), ReportError> {
        let prepared = registry
            .prepared()
            .filter(|p| p.kind() == BackendKind::Remote)
            .ok_or_else(|| ReportError::NotPrepared {
                registry: registry.run_name().to_string(),
                kind: BackendKind::Remote,
            })?;

        let points: Vec<TimeSeriesPoint> = prepared
            .records()
            .filter_map(|(_, record)| match record {
                PreparedRecord::Point(point) => Some(point.clone()),
                PreparedRecord::Line(_) => None,
            })
            .collect();

        let batch_size = self.config.batch_size.max(1);
        for (batch_index, batch) in points.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;
            self.client
                .write_time_series(&self.config.project_id, batch)
                .await
                .map_err(|e| match e {
                    RemoteError::Timeout => ReportError::RemoteTimeout,
                    RemoteError::PointsRejected { rejected, message } => {
                        ReportError::RemoteWrite {
                            rejected: rejected.into_iter().map(|i| i + offset).collect(),
                            message,
                        }
                    }
                    other => ReportError::Remote(other),
                })?;
        }

        tracing::info!(
            project = %self.config.project_id,
            points = points.len(),
            run = registry.run_name(),
            "wrote time series to remote monitoring service"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::testing::FakeMonitoringClient;

    fn backend_with(client: Arc<FakeMonitoringClient>, batch_size: usize) -> RemoteMonitoringBackend {
        RemoteMonitoringBackend::new(
            client,
            RemoteConfig::new("test-project").with_batch_size(batch_size),
        )
    }

    #[test]
    fn test_validate_rejects_unknown_unit() {
        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", 1.0, "fortnights").unwrap();

        let backend = backend_with(Arc::new(FakeMonitoringClient::new()), 200);
        let err = backend.validate(&registry).unwrap_err();
        assert!(matches!(err, ReportError::InvalidMetric(msg) if msg.contains("fortnights")));
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", f64::NAN, "seconds").unwrap();

        let backend = backend_with(Arc::new(FakeMonitoringClient::new()), 200);
        assert!(backend.validate(&registry).is_err());
    }

    #[test]
    fn test_prepare_maps_metrics_to_points() {
        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", 123.34, "seconds").unwrap();
        registry.add_metric("successful", 1, "hours").unwrap();

        let backend = backend_with(Arc::new(FakeMonitoringClient::new()), 200);
        backend.prepare(&mut registry).unwrap();

        let prepared = registry.prepared().unwrap();
        assert_eq!(prepared.kind(), BackendKind::Remote);

        let points: Vec<_> = prepared
            .records()
            .filter_map(|(_, r)| match r {
                PreparedRecord::Point(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].metric_type, "custom.googleapis.com/deploy/time");
        assert_eq!(points[0].value, PointValue::DoubleValue(123.34));
        assert_eq!(points[1].value, PointValue::Int64Value(1));
        assert_eq!(points[0].resource_labels["project_id"], "test-project");
    }

    #[tokio::test]
    async fn test_send_batches_by_configured_size() {
        let mut registry = MetricsRegistry::new("deploy");
        for i in 0..5 {
            registry
                .add_metric(format!("metric_{}", i), i as i64, "count")
                .unwrap();
        }

        let client = Arc::new(FakeMonitoringClient::new());
        let backend = backend_with(Arc::clone(&client), 2);
        backend.prepare(&mut registry).unwrap();
        backend.send(&registry).await.unwrap();

        let state = client.state.lock().unwrap();
        assert_eq!(state.write_batches, vec![2, 2, 1]);
        assert_eq!(state.points_written.len(), 5);
    }

    #[tokio::test]
    async fn test_rejected_indices_are_registry_relative() {
        let mut registry = MetricsRegistry::new("deploy");
        for i in 0..4 {
            registry
                .add_metric(format!("metric_{}", i), i as i64, "count")
                .unwrap();
        }

        let client = Arc::new(FakeMonitoringClient::new());
        *client.fail_write_on.lock().unwrap() = Some((
            1,
            RemoteError::PointsRejected {
                rejected: vec![1],
                message: "bad point".to_string(),
            },
        ));

        let backend = backend_with(Arc::clone(&client), 2);
        backend.prepare(&mut registry).unwrap();

        // Second batch covers registry indices 2..4, so batch index 1 maps to 3
        let err = backend.send(&registry).await.unwrap_err();
        match err {
            ReportError::RemoteWrite { rejected, .. } => assert_eq!(rejected, vec![3]),
            other => panic!("unexpected error: {other}"),
        }

        // The accepted first batch stays written and is not retried
        assert_eq!(client.state.lock().unwrap().write_batches, vec![2]);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_remote_timeout() {
        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", 1.0, "seconds").unwrap();

        let client = Arc::new(FakeMonitoringClient::new());
        *client.fail_write_on.lock().unwrap() = Some((0, RemoteError::Timeout));

        let backend = backend_with(Arc::clone(&client), 200);
        backend.prepare(&mut registry).unwrap();

        let err = backend.send(&registry).await.unwrap_err();
        assert!(matches!(err, ReportError::RemoteTimeout));
    }
}
