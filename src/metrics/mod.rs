//! Metric collection for a single run
//!
//! A run creates one [`MetricsRegistry`], appends [`Metric`]s as work
//! proceeds, then hands the registry to the dispatcher for delivery.

mod registry;
mod value;

pub use registry::{Metric, MetricError, MetricsRegistry, PreparedRecord, PreparedSet};
pub use value::{MetricValue, TypeTag};
