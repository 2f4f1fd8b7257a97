use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::definitions::{AlertPolicyDefinition, NotificationChannelDefinition};
use crate::monitoring::{AlertPolicy, MonitoringClient, NotificationChannel, RemoteError};

/// Reconciles desired alert policies against the live remote state
///
/// Each desired policy independently reaches one of the terminal states in
/// [`PolicyOutcome`]; a failure for one policy never aborts the batch, so an
/// operator sees the full picture at the end.
pub struct AlertPolicyReconciler {
    client: Arc<dyn MonitoringClient>,
    project_id: String,
}

/// Terminal state of one desired policy after a reconcile pass
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    Created,
    Updated,
    Unchanged,
    Failed(String),
}

impl std::fmt::Display for PolicyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyOutcome::Created => write!(f, "created"),
            PolicyOutcome::Updated => write!(f, "updated"),
            PolicyOutcome::Unchanged => write!(f, "unchanged"),
            PolicyOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of one desired policy
#[derive(Debug, Clone)]
pub struct ReconcileEntry {
    pub display_name: String,
    pub outcome: PolicyOutcome,
}

/// Batch report of a reconcile pass, one entry per desired policy
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub entries: Vec<ReconcileEntry>,
}

impl ReconcileReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, PolicyOutcome::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, PolicyOutcome::Updated))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, PolicyOutcome::Unchanged))
    }

    pub fn failed(&self) -> Vec<&ReconcileEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, PolicyOutcome::Failed(_)))
            .collect()
    }

    /// True when no policy failed
    pub fn is_clean(&self) -> bool {
        self.failed().is_empty()
    }

    pub fn outcome(&self, display_name: &str) -> Option<&PolicyOutcome> {
        self.entries
            .iter()
            .find(|e| e.display_name == display_name)
            .map(|e| &e.outcome)
    }

    fn count(&self, pred: impl Fn(&PolicyOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} policies: {} created, {} updated, {} unchanged, {} failed",
            self.entries.len(),
            self.created(),
            self.updated(),
            self.unchanged(),
            self.failed().len()
        )?;
        for entry in &self.entries {
            writeln!(f, "  {}: {}", entry.display_name, entry.outcome)?;
        }
        Ok(())
    }
}

/// Reconciliation errors, recorded per policy
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("no definition for referenced notification channel `{0}`")]
    UnknownChannel(String),

    #[error("remote object `{0}` carries no identifier")]
    MissingRemoteId(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl AlertPolicyReconciler {
    pub fn new(client: Arc<dyn MonitoringClient>, project_id: impl Into<String>) -> Self {
        Self {
            client,
            project_id: project_id.into(),
        }
    }

    /// Run one reconcile pass over the desired definitions
    ///
    /// Channel references resolve against the remote listing by exact
    /// display-name match, creating absent channels from their definitions;
    /// identifiers of channels created during the pass are cached for its
    /// remainder. Policies are then created, updated (full replace) or left
    /// unchanged by field-wise comparison.
    pub async fn reconcile(
        &self,
        policies: &[AlertPolicyDefinition],
        channels: &[NotificationChannelDefinition],
    ) -> ReconcileReport {
        let (existing_policies, existing_channels) = match self.fetch_remote_state().await {
            Ok(state) => state,
            Err(e) => {
                // Without the remote listings nothing can be reconciled
                tracing::error!(project = %self.project_id, error = %e, "failed to list remote state");
                return ReconcileReport {
                    entries: policies
                        .iter()
                        .map(|p| ReconcileEntry {
                            display_name: p.display_name.clone(),
                            outcome: PolicyOutcome::Failed(e.to_string()),
                        })
                        .collect(),
                };
            }
        };

        let mut channel_cache: HashMap<String, String> = HashMap::new();
        let mut entries = Vec::with_capacity(policies.len());

        for definition in policies {
            let outcome = match self
                .reconcile_policy(definition, channels, &existing_policies, &existing_channels, &mut channel_cache)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        policy = %definition.display_name,
                        error = %e,
                        "policy reconciliation failed"
                    );
                    PolicyOutcome::Failed(e.to_string())
                }
            };

            tracing::info!(
                policy = %definition.display_name,
                outcome = %outcome,
                "reconciled alert policy"
            );
            entries.push(ReconcileEntry {
                display_name: definition.display_name.clone(),
                outcome,
            });
        }

        ReconcileReport { entries }
    }

    async fn fetch_remote_state(
        &self,
    ) -> Result<(Vec<AlertPolicy>, Vec<NotificationChannel>), RemoteError> {
        let policies = self.client.list_alert_policies(&self.project_id).await?;
        let channels = self
            .client
            .list_notification_channels(&self.project_id)
            .await?;
        Ok((policies, channels))
    }

    async fn reconcile_policy(
        &self,
        definition: &AlertPolicyDefinition,
        channel_defs: &[NotificationChannelDefinition],
        existing_policies: &[AlertPolicy],
        existing_channels: &[NotificationChannel],
        channel_cache: &mut HashMap<String, String>,
    ) -> Result<PolicyOutcome, ReconcileError> {
        let mut channel_ids = Vec::with_capacity(definition.notification_channels.len());
        for channel_name in &definition.notification_channels {
            let id = self
                .resolve_channel(channel_name, channel_defs, existing_channels, channel_cache)
                .await?;
            channel_ids.push(id);
        }

        let payload = definition.to_payload(channel_ids);
        let found = existing_policies
            .iter()
            .find(|p| p.display_name == definition.display_name);

        match found {
            None => {
                self.client
                    .create_alert_policy(&self.project_id, &payload)
                    .await?;
                Ok(PolicyOutcome::Created)
            }
            Some(existing) if policies_match(&payload, existing) => Ok(PolicyOutcome::Unchanged),
            Some(existing) => {
                let policy_id = existing
                    .name
                    .as_deref()
                    .ok_or_else(|| ReconcileError::MissingRemoteId(existing.display_name.clone()))?;
                self.client.update_alert_policy(policy_id, &payload).await?;
                Ok(PolicyOutcome::Updated)
            }
        }
    }

    /// Resolve a channel display name to its remote identifier
    ///
    /// Display names are not guaranteed unique by the remote service; on
    /// duplicates the first match wins with a warning.
    async fn resolve_channel(
        &self,
        display_name: &str,
        channel_defs: &[NotificationChannelDefinition],
        existing_channels: &[NotificationChannel],
        channel_cache: &mut HashMap<String, String>,
    ) -> Result<String, ReconcileError> {
        if let Some(id) = channel_cache.get(display_name) {
            return Ok(id.clone());
        }

        let matches: Vec<&NotificationChannel> = existing_channels
            .iter()
            .filter(|c| c.display_name == display_name)
            .collect();
        if matches.len() > 1 {
            tracing::warn!(
                channel = display_name,
                matches = matches.len(),
                "duplicate notification channel display names, taking the first match"
            );
        }
        if let Some(found) = matches.first() {
            let id = found
                .name
                .as_deref()
                .ok_or_else(|| ReconcileError::MissingRemoteId(display_name.to_string()))?;
            channel_cache.insert(display_name.to_string(), id.to_string());
            return Ok(id.to_string());
        }

        let definition = channel_defs
            .iter()
            .find(|d| d.display_name == display_name)
            .ok_or_else(|| ReconcileError::UnknownChannel(display_name.to_string()))?;

        let created = self
            .client
            .create_notification_channel(&self.project_id, &definition.to_payload())
            .await?;
        let id = created
            .name
            .ok_or_else(|| ReconcileError::MissingRemoteId(display_name.to_string()))?;
        tracing::info!(channel = display_name, id = %id, "created notification channel");
        channel_cache.insert(display_name.to_string(), id.clone());
        Ok(id)
    }
}

/// Field-wise equality between the desired payload and an existing policy
///
/// Conditions compare field-by-field in order; channel identifiers compare
/// as sets. The remote identifier is excluded: it is service-owned.
fn policies_match(desired: &AlertPolicy, existing: &AlertPolicy) -> bool {
    let desired_channels: BTreeSet<&String> = desired.notification_channels.iter().collect();
    let existing_channels: BTreeSet<&String> = existing.notification_channels.iter().collect();

    desired.display_name == existing.display_name
        && desired.combiner == existing.combiner
        && desired.documentation == existing.documentation
        && desired.conditions == existing.conditions
        && desired_channels == existing_channels
}
