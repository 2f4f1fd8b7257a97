//! Desired-state definitions for alert policies and notification channels
//!
//! Definitions are what the caller declares; they reference channels by
//! display name and carry no remote identifiers. Serde derives let callers
//! load them from declarative files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::monitoring::{
    AlertPolicy, ChannelType, Combiner, Comparison, Documentation, NotificationChannel,
    ThresholdCondition,
};

/// A desired alert policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicyDefinition {
    pub display_name: String,
    pub documentation: Documentation,
    pub combiner: Combiner,
    /// Ordered: submitted to the remote service unchanged
    pub conditions: Vec<ConditionDefinition>,
    /// Referenced notification channels, by display name
    pub notification_channels: Vec<String>,
}

impl AlertPolicyDefinition {
    pub fn new(display_name: impl Into<String>, combiner: Combiner) -> Self {
        Self {
            display_name: display_name.into(),
            documentation: Documentation {
                content: String::new(),
                mime_type: "text/markdown".to_string(),
            },
            combiner,
            conditions: Vec::new(),
            notification_channels: Vec::new(),
        }
    }

    pub fn with_documentation(mut self, content: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.documentation = Documentation {
            content: content.into(),
            mime_type: mime_type.into(),
        };
        self
    }

    pub fn with_condition(mut self, condition: ConditionDefinition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_channel(mut self, display_name: impl Into<String>) -> Self {
        self.notification_channels.push(display_name.into());
        self
    }

    /// Build the remote create/update payload with channel refs resolved to
    /// remote identifiers
    pub fn to_payload(&self, channel_ids: Vec<String>) -> AlertPolicy {
        AlertPolicy {
            name: None,
            display_name: self.display_name.clone(),
            documentation: self.documentation.clone(),
            combiner: self.combiner,
            conditions: self.conditions.iter().map(ConditionDefinition::to_wire).collect(),
            notification_channels: channel_ids,
        }
    }
}

/// A desired threshold condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    pub display_name: String,
    pub threshold_value: f64,
    pub filter: String,
    pub duration_seconds: i64,
    pub comparison: Comparison,
    pub trigger_count: u32,
}

impl ConditionDefinition {
    fn to_wire(&self) -> ThresholdCondition {
        ThresholdCondition {
            display_name: self.display_name.clone(),
            threshold_value: self.threshold_value,
            filter: self.filter.clone(),
            duration_seconds: self.duration_seconds,
            comparison: self.comparison,
            trigger_count: self.trigger_count,
        }
    }
}

/// A desired notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationChannelDefinition {
    pub channel_type: ChannelType,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl NotificationChannelDefinition {
    pub fn new(channel_type: ChannelType, display_name: impl Into<String>) -> Self {
        Self {
            channel_type,
            display_name: display_name.into(),
            description: String::new(),
            labels: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn to_payload(&self) -> NotificationChannel {
        NotificationChannel {
            name: None,
            channel_type: self.channel_type,
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            labels: self.labels.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_preserves_condition_order() {
        let definition = AlertPolicyDefinition::new("magic alert policy", Combiner::And)
            .with_condition(ConditionDefinition {
                display_name: "second".to_string(),
                threshold_value: 22.0,
                filter: "resource.type=global".to_string(),
                duration_seconds: 60,
                comparison: Comparison::GreaterThan,
                trigger_count: 3,
            })
            .with_condition(ConditionDefinition {
                display_name: "first".to_string(),
                threshold_value: 1.0,
                filter: "resource.type=global".to_string(),
                duration_seconds: 30,
                comparison: Comparison::LessThan,
                trigger_count: 1,
            });

        let payload = definition.to_payload(vec!["projects/p/notificationChannels/1".into()]);
        assert!(payload.name.is_none());
        let names: Vec<_> = payload.conditions.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn test_definition_round_trips_through_serde() {
        let definition = NotificationChannelDefinition::new(ChannelType::Email, "support")
            .with_description("Main support team")
            .with_label("email_address", "support@example.com");

        let json = serde_json::to_string(&definition).unwrap();
        let parsed: NotificationChannelDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, definition);
    }
}
