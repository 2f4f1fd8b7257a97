//! Wire types for the remote monitoring service

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time-series data point as accepted by the write call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Metric type string, e.g. `custom.googleapis.com/<run>/<metric>`
    pub metric_type: String,
    /// Monitored resource type the point is attached to
    pub resource_type: String,
    pub resource_labels: HashMap<String, String>,
    pub value: PointValue,
    pub end_time: DateTime<Utc>,
}

/// Typed point value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointValue {
    Int64Value(i64),
    DoubleValue(f64),
    StringValue(String),
}

/// How multiple conditions within a policy combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Combiner {
    And,
    Or,
    AndWithMatchingResource,
}

/// Threshold comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    NotEqual,
}

/// Long-form documentation attached to an alert policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub content: String,
    pub mime_type: String,
}

/// One threshold condition within an alert policy
///
/// Condition order is preserved on the wire; the remote service may be
/// order-sensitive for evaluation semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdCondition {
    pub display_name: String,
    pub threshold_value: f64,
    /// Filter expression selecting the time series the condition evaluates
    pub filter: String,
    pub duration_seconds: i64,
    pub comparison: Comparison,
    pub trigger_count: u32,
}

/// An alert policy as the remote service represents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPolicy {
    /// Remote identifier, e.g. `projects/<p>/alertPolicies/<id>`. Owned by
    /// the remote service: absent in create payloads, present in responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub display_name: String,
    pub documentation: Documentation,
    pub combiner: Combiner,
    pub conditions: Vec<ThresholdCondition>,
    /// Remote notification channel identifiers
    pub notification_channels: Vec<String>,
}

/// Notification channel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Email,
    Webhook,
    Sms,
}

/// A notification channel as the remote service represents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChannel {
    /// Remote identifier, owned by the remote service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub display_name: String,
    pub description: String,
    pub labels: HashMap<String, String>,
}
