use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{BackendKind, ReportError};
use crate::metrics::{MetricValue, MetricsRegistry, PreparedRecord, PreparedSet};

/// Local durable sink: one self-describing JSON object per line
///
/// Best-effort audit log, not a source of truth: each send truncates the
/// sink path and rewrites it, and a crash mid-write may leave a partial
/// file.
pub struct LocalBackend {
    sink_path: PathBuf,
}

/// Line schema of the sink file
#[derive(Serialize)]
struct SinkRecord<'a> {
    metric_name: &'a str,
    value: &'a MetricValue,
    #[serde(rename = "type")]
    type_tag: &'a str,
    unit: &'a str,
}

impl LocalBackend {
    pub fn new(sink_path: impl AsRef<Path>) -> Self {
        Self {
            sink_path: sink_path.as_ref().to_path_buf(),
        }
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    /// The local sink has no schema constraints
    pub fn validate(&self, _registry: &MetricsRegistry) -> Result<(), ReportError> {
        Ok(())
    }

    pub fn prepare(&self, registry: &mut MetricsRegistry) -> Result<(), ReportError> {
        if registry.is_prepared_for(BackendKind::Local) {
            return Ok(());
        }

        let mut records = Vec::with_capacity(registry.len());
        for metric in registry.metrics() {
            let record = SinkRecord {
                metric_name: metric.name(),
                value: metric.value(),
                type_tag: metric.type_tag().as_str(),
                unit: metric.unit(),
            };
            let line = serde_json::to_string(&record)
                .map_err(|e| ReportError::InvalidMetric(e.to_string()))?;
            records.push((metric.name().to_string(), PreparedRecord::Line(line)));
        }

        registry.set_prepared(PreparedSet::new(BackendKind::Local, records));
        Ok(())
    }

    pub fn send(&self, registry: &MetricsRegistry) -> Result<(), ReportError> {
        let prepared = registry
            .prepared()
            .filter(|p| p.kind() == BackendKind::Local)
            .ok_or_else(|| ReportError::NotPrepared {
                registry: registry.run_name().to_string(),
                kind: BackendKind::Local,
            })?;

        let file = File::create(&self.sink_path)?;
        let mut writer = BufWriter::new(file);
        for (_, record) in prepared.records() {
            if let PreparedRecord::Line(line) = record {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()?;

        tracing::info!(
            sink = %self.sink_path.display(),
            metrics = prepared.len(),
            run = registry.run_name(),
            "wrote metrics to local sink"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_sink_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink_path = temp_dir.path().join("metrics.log");

        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", 123.34, "seconds").unwrap();
        registry.add_metric("successful", 1, "hours").unwrap();

        let backend = LocalBackend::new(&sink_path);
        backend.validate(&registry).unwrap();
        backend.prepare(&mut registry).unwrap();
        backend.send(&registry).unwrap();

        let contents = std::fs::read_to_string(&sink_path).unwrap();
        assert!(contents.ends_with('\n'));
        let mut entries: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        entries.sort_by_key(|e| e["metric_name"].as_str().unwrap().to_string());

        assert_eq!(
            entries,
            vec![
                serde_json::json!({
                    "metric_name": "successful",
                    "value": 1,
                    "type": "int",
                    "unit": "hours",
                }),
                serde_json::json!({
                    "metric_name": "time",
                    "value": 123.34,
                    "type": "float",
                    "unit": "seconds",
                }),
            ]
        );
    }

    #[test]
    fn test_send_truncates_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let sink_path = temp_dir.path().join("metrics.log");
        std::fs::write(&sink_path, "stale line\n").unwrap();

        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", 1.5, "seconds").unwrap();

        let backend = LocalBackend::new(&sink_path);
        backend.prepare(&mut registry).unwrap();
        backend.send(&registry).unwrap();

        let contents = std::fs::read_to_string(&sink_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(!contents.contains("stale"));
    }

    #[test]
    fn test_unwritable_sink_is_a_write_error() {
        let mut registry = MetricsRegistry::new("deploy");
        registry.add_metric("time", 1.5, "seconds").unwrap();

        let backend = LocalBackend::new("/nonexistent-dir/metrics.log");
        backend.prepare(&mut registry).unwrap();

        let err = backend.send(&registry).unwrap_err();
        assert!(matches!(err, ReportError::SinkWrite(_)));
    }

    #[test]
    fn test_send_without_prepare_fails() {
        let temp_dir = TempDir::new().unwrap();
        let registry = MetricsRegistry::new("deploy");

        let backend = LocalBackend::new(temp_dir.path().join("metrics.log"));
        let err = backend.send(&registry).unwrap_err();
        assert!(matches!(err, ReportError::NotPrepared { .. }));
    }
}
