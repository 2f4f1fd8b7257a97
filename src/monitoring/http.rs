use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{AlertPolicy, NotificationChannel, TimeSeriesPoint};
use super::{MonitoringClient, RemoteError};

/// HTTP client for the remote monitoring service's REST surface
///
/// Authentication is the caller's concern: the client is constructed with an
/// already-acquired bearer token. Every request is bounded by the configured
/// timeout; an elapsed deadline surfaces as [`RemoteError::Timeout`] rather
/// than a hang, though the remote side may still have applied the write.
#[derive(Debug, Clone)]
pub struct HttpMonitoringClient {
    http_client: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl HttpMonitoringClient {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v3/{}", self.base_url, path)
    }

    fn map_send_error(e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Network(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, RemoteError> {
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Deserialization(e.to_string()))
    }

    async fn send_json<B, T>(&self, method: reqwest::Method, url: String, body: &B) -> Result<T, RemoteError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http_client
            .request(method, &url)
            .bearer_auth(&self.auth_token)
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Deserialization(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPoliciesResponse {
    #[serde(default)]
    alert_policies: Vec<AlertPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListChannelsResponse {
    #[serde(default)]
    notification_channels: Vec<NotificationChannel>,
}

/// Body of a failed write-time-series response carrying per-point rejections
#[derive(Debug, Deserialize)]
struct WriteRejection {
    rejected: Vec<usize>,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl MonitoringClient for HttpMonitoringClient {
    async fn write_time_series(
        &self,
        project_id: &str,
        points: &[TimeSeriesPoint],
    ) -> Result<(), RemoteError> {
        let url = self.url(&format!("projects/{}/timeSeries", project_id));
        let body = serde_json::json!({ "timeSeries": points });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        if let Ok(rejection) = serde_json::from_str::<WriteRejection>(&message) {
            return Err(RemoteError::PointsRejected {
                rejected: rejection.rejected,
                message: rejection.message,
            });
        }
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn list_alert_policies(&self, project_id: &str) -> Result<Vec<AlertPolicy>, RemoteError> {
        let url = self.url(&format!("projects/{}/alertPolicies", project_id));
        let response: ListPoliciesResponse = self.get_json(url).await?;
        Ok(response.alert_policies)
    }

    async fn get_alert_policy(&self, policy_id: &str) -> Result<AlertPolicy, RemoteError> {
        self.get_json(self.url(policy_id)).await
    }

    async fn create_alert_policy(
        &self,
        project_id: &str,
        policy: &AlertPolicy,
    ) -> Result<AlertPolicy, RemoteError> {
        let url = self.url(&format!("projects/{}/alertPolicies", project_id));
        self.send_json(reqwest::Method::POST, url, policy).await
    }

    async fn update_alert_policy(
        &self,
        policy_id: &str,
        policy: &AlertPolicy,
    ) -> Result<AlertPolicy, RemoteError> {
        self.send_json(reqwest::Method::PUT, self.url(policy_id), policy)
            .await
    }

    async fn list_notification_channels(
        &self,
        project_id: &str,
    ) -> Result<Vec<NotificationChannel>, RemoteError> {
        let url = self.url(&format!("projects/{}/notificationChannels", project_id));
        let response: ListChannelsResponse = self.get_json(url).await?;
        Ok(response.notification_channels)
    }

    async fn create_notification_channel(
        &self,
        project_id: &str,
        channel: &NotificationChannel,
    ) -> Result<NotificationChannel, RemoteError> {
        let url = self.url(&format!("projects/{}/notificationChannels", project_id));
        self.send_json(reqwest::Method::POST, url, channel).await
    }
}
