use std::collections::HashMap;

use super::{MetricValue, TypeTag};
use crate::monitoring::TimeSeriesPoint;
use crate::report::BackendKind;

/// A single named measurement produced during a run
///
/// Immutable once added to a registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    value: MetricValue,
    unit: String,
}

impl Metric {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn type_tag(&self) -> TypeTag {
        self.value.type_tag()
    }
}

/// Backend-specific serialized form of one metric
#[derive(Debug, Clone)]
pub enum PreparedRecord {
    /// One self-describing JSON line for the local sink
    Line(String),
    /// One time-series point for the remote monitoring service
    Point(TimeSeriesPoint),
}

/// The prepared forms for one registry, tagged with the backend that built them
///
/// A registry holds at most one prepared set at a time; preparing for a
/// backend with a different schema replaces it.
#[derive(Debug, Clone)]
pub struct PreparedSet {
    kind: BackendKind,
    records: Vec<(String, PreparedRecord)>,
}

impl PreparedSet {
    pub fn new(kind: BackendKind, records: Vec<(String, PreparedRecord)>) -> Self {
        Self { kind, records }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Prepared records in the registry's iteration order
    pub fn records(&self) -> impl Iterator<Item = &(String, PreparedRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ordered, named collection of metrics for one run
///
/// Append-only while the run proceeds; handed once to the dispatcher and
/// then discarded. No network or disk I/O happens here.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    run_name: String,
    metrics: Vec<Metric>,
    index: HashMap<String, usize>,
    prepared: Option<PreparedSet>,
}

impl MetricsRegistry {
    /// Create an empty registry for the named run
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            metrics: Vec::new(),
            index: HashMap::new(),
            prepared: None,
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Add a metric to the registry
    ///
    /// Names are unique within a registry; re-adding a name fails and
    /// leaves the registry unchanged.
    pub fn add_metric(
        &mut self,
        name: impl Into<String>,
        value: impl Into<MetricValue>,
        unit: impl Into<String>,
    ) -> Result<(), MetricError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(MetricError::DuplicateMetric(name));
        }

        self.index.insert(name.clone(), self.metrics.len());
        self.metrics.push(Metric {
            name,
            value: value.into(),
            unit: unit.into(),
        });
        Ok(())
    }

    /// Iterate over metrics in insertion order
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter()
    }

    /// Look up a metric by name
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.index.get(name).map(|&i| &self.metrics[i])
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Whether the registry currently holds prepared forms for `kind`
    pub fn is_prepared_for(&self, kind: BackendKind) -> bool {
        self.prepared.as_ref().map(|p| p.kind()) == Some(kind)
    }

    /// Store prepared forms, replacing any previous backend's set
    pub fn set_prepared(&mut self, prepared: PreparedSet) {
        self.prepared = Some(prepared);
    }

    pub fn prepared(&self) -> Option<&PreparedSet> {
        self.prepared.as_ref()
    }

    pub fn clear_prepared(&mut self) {
        self.prepared = None;
    }
}

/// Metric collection errors
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("metric `{0}` is already registered")]
    DuplicateMetric(String),

    #[error("unsupported metric value: {0}")]
    UnsupportedType(String),
}
