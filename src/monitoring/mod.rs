//! Client interface to the remote monitoring service
//!
//! The caller supplies an authenticated client handle; everything in this
//! crate talks to the remote service through the [`MonitoringClient`] trait
//! so tests can substitute an in-memory implementation.

mod http;
mod types;

pub use http::HttpMonitoringClient;
pub use types::{
    AlertPolicy, ChannelType, Combiner, Comparison, Documentation, NotificationChannel,
    PointValue, ThresholdCondition, TimeSeriesPoint,
};

use async_trait::async_trait;

/// Remote monitoring service operations used by the backends and reconciler
///
/// Remote identifiers (`AlertPolicy::name`, `NotificationChannel::name`) are
/// assigned by the service and returned from the create calls; they are
/// never generated locally. The client is reusable and safe for concurrent
/// use across backend sends within one dispatch.
#[async_trait]
pub trait MonitoringClient: Send + Sync {
    /// Write a batch of time-series points to the project
    async fn write_time_series(
        &self,
        project_id: &str,
        points: &[TimeSeriesPoint],
    ) -> Result<(), RemoteError>;

    async fn list_alert_policies(&self, project_id: &str) -> Result<Vec<AlertPolicy>, RemoteError>;

    async fn get_alert_policy(&self, policy_id: &str) -> Result<AlertPolicy, RemoteError>;

    /// Create a policy; the response carries the assigned identifier
    async fn create_alert_policy(
        &self,
        project_id: &str,
        policy: &AlertPolicy,
    ) -> Result<AlertPolicy, RemoteError>;

    /// Full-replace update of an existing policy
    async fn update_alert_policy(
        &self,
        policy_id: &str,
        policy: &AlertPolicy,
    ) -> Result<AlertPolicy, RemoteError>;

    async fn list_notification_channels(
        &self,
        project_id: &str,
    ) -> Result<Vec<NotificationChannel>, RemoteError>;

    async fn create_notification_channel(
        &self,
        project_id: &str,
        channel: &NotificationChannel,
    ) -> Result<NotificationChannel, RemoteError>;
}

/// Remote call errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    /// The caller-supplied deadline elapsed before a response arrived. The
    /// remote side may still have applied the write.
    #[error("remote call timed out")]
    Timeout,

    #[error("remote API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A write-time-series call rejected some points; indices are relative
    /// to the submitted batch.
    #[error("{} point(s) rejected: {message}", .rejected.len())]
    PointsRejected { rejected: Vec<usize>, message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory monitoring client for unit tests

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeState {
        pub policies: Vec<AlertPolicy>,
        pub channels: Vec<NotificationChannel>,
        /// Sizes of the batches passed to write_time_series, in call order
        pub write_batches: Vec<usize>,
        pub points_written: Vec<TimeSeriesPoint>,
        pub create_policy_calls: usize,
        pub update_policy_calls: usize,
        pub create_channel_calls: usize,
        next_id: u64,
    }

    /// In-memory stand-in for the remote monitoring service
    ///
    /// Assigns identifiers on create and keeps state across calls so
    /// reconcile passes observe their own writes.
    #[derive(Default)]
    pub struct FakeMonitoringClient {
        pub state: Mutex<FakeState>,
        /// When set, the write_time_series call with this zero-based index
        /// fails with the given error; earlier calls succeed
        pub fail_write_on: Mutex<Option<(usize, RemoteError)>>,
        /// When set, fail policies whose display name matches
        pub fail_policy: Mutex<Option<String>>,
    }

    impl FakeMonitoringClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_channel(self, channel: NotificationChannel) -> Self {
            self.state.lock().unwrap().channels.push(channel);
            self
        }

        fn assign_id(state: &mut FakeState, kind: &str) -> String {
            state.next_id += 1;
            format!("projects/test-project/{}/{}", kind, state.next_id)
        }
    }

    #[async_trait]
    impl MonitoringClient for FakeMonitoringClient {
        async fn write_time_series(
            &self,
            _project_id: &str,
            points: &[TimeSeriesPoint],
        ) -> Result<(), RemoteError> {
            let mut state = self.state.lock().unwrap();
            let call_index = state.write_batches.len();
            if let Some((fail_index, err)) = self.fail_write_on.lock().unwrap().clone() {
                if call_index == fail_index {
                    return Err(err);
                }
            }
            state.write_batches.push(points.len());
            state.points_written.extend_from_slice(points);
            Ok(())
        }

        async fn list_alert_policies(
            &self,
            _project_id: &str,
        ) -> Result<Vec<AlertPolicy>, RemoteError> {
            Ok(self.state.lock().unwrap().policies.clone())
        }

        async fn get_alert_policy(&self, policy_id: &str) -> Result<AlertPolicy, RemoteError> {
            self.state
                .lock()
                .unwrap()
                .policies
                .iter()
                .find(|p| p.name.as_deref() == Some(policy_id))
                .cloned()
                .ok_or_else(|| RemoteError::Api {
                    status: 404,
                    message: format!("policy {} not found", policy_id),
                })
        }

        async fn create_alert_policy(
            &self,
            _project_id: &str,
            policy: &AlertPolicy,
        ) -> Result<AlertPolicy, RemoteError> {
            if let Some(bad) = self.fail_policy.lock().unwrap().clone() {
                if policy.display_name == bad {
                    return Err(RemoteError::Api {
                        status: 400,
                        message: "malformed filter expression".to_string(),
                    });
                }
            }
            let mut state = self.state.lock().unwrap();
            state.create_policy_calls += 1;
            let mut created = policy.clone();
            created.name = Some(Self::assign_id(&mut state, "alertPolicies"));
            state.policies.push(created.clone());
            Ok(created)
        }

        async fn update_alert_policy(
            &self,
            policy_id: &str,
            policy: &AlertPolicy,
        ) -> Result<AlertPolicy, RemoteError> {
            let mut state = self.state.lock().unwrap();
            state.update_policy_calls += 1;
            let existing = state
                .policies
                .iter_mut()
                .find(|p| p.name.as_deref() == Some(policy_id))
                .ok_or_else(|| RemoteError::Api {
                    status: 404,
                    message: format!("policy {} not found", policy_id),
                })?;
            *existing = AlertPolicy {
                name: Some(policy_id.to_string()),
                ..policy.clone()
            };
            Ok(existing.clone())
        }

        async fn list_notification_channels(
            &self,
            _project_id: &str,
        ) -> Result<Vec<NotificationChannel>, RemoteError> {
            Ok(self.state.lock().unwrap().channels.clone())
        }

        async fn create_notification_channel(
            &self,
            _project_id: &str,
            channel: &NotificationChannel,
        ) -> Result<NotificationChannel, RemoteError> {
            let mut state = self.state.lock().unwrap();
            state.create_channel_calls += 1;
            let mut created = channel.clone();
            created.name = Some(Self::assign_id(&mut state, "notificationChannels"));
            state.channels.push(created.clone());
            Ok(created)
        }
    }

    /// Hash map literal helper for channel labels
    pub fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
