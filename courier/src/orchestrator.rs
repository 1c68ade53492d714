//! Fan-out of post-registration side effects
//!
//! After the registration itself has been committed, four follow-up
//! tasks run concurrently: artifact generation, audit-record
//! persistence, the participant confirmation mail, and the admin
//! alert. Each task is failure-isolated; one failing (or panicking)
//! task never prevents the others from completing, and the aggregate
//! outcome is reported rather than propagated.

use std::sync::Arc;

use courier_common::Registration;
use courier_delivery::{DeliveryEngine, DeliveryResult, OutboundMessage};
use futures_util::future::join_all;
use tokio::task::JoinHandle;

use crate::collaborators::{ArtifactGenerator, AuditPayload, AuditStore};
use crate::{content, report};

pub const TASK_ARTIFACT: &str = "artifact_generation";
pub const TASK_AUDIT: &str = "audit_record";
pub const TASK_CONFIRMATION: &str = "confirmation_email";
pub const TASK_ADMIN_ALERT: &str = "admin_alert_email";

/// Terminal state of one fan-out task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
}

/// Aggregate outcome of one fan-out run, one entry per task.
#[derive(Debug, Clone)]
pub struct FanOutReport {
    entries: Vec<(&'static str, TaskOutcome)>,
}

impl FanOutReport {
    #[must_use]
    pub fn outcome(&self, task: &str) -> Option<&TaskOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| *name == task)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, TaskOutcome)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tasks that did not succeed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TaskOutcome::Failed(_)))
            .count()
    }
}

/// Runs the post-registration side effects.
pub struct Orchestrator {
    engine: Arc<DeliveryEngine>,
    artifacts: Arc<dyn ArtifactGenerator>,
    audit: Arc<dyn AuditStore>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        engine: Arc<DeliveryEngine>,
        artifacts: Arc<dyn ArtifactGenerator>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            engine,
            artifacts,
            audit,
        }
    }

    /// Run all follow-up tasks for one registration and await the
    /// aggregate outcome.
    pub async fn dispatch(self: &Arc<Self>, registration: Registration) -> FanOutReport {
        let registration = Arc::new(registration);

        let handles: Vec<(&'static str, JoinHandle<TaskOutcome>)> = vec![
            (
                TASK_ARTIFACT,
                tokio::spawn(Self::run_artifact(Arc::clone(self), Arc::clone(&registration))),
            ),
            (
                TASK_AUDIT,
                tokio::spawn(Self::run_audit(Arc::clone(self), Arc::clone(&registration))),
            ),
            (
                TASK_CONFIRMATION,
                tokio::spawn(Self::run_confirmation(
                    Arc::clone(self),
                    Arc::clone(&registration),
                )),
            ),
            (
                TASK_ADMIN_ALERT,
                tokio::spawn(Self::run_admin_alert(
                    Arc::clone(self),
                    Arc::clone(&registration),
                )),
            ),
        ];

        let (names, joins): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes = join_all(joins).await;

        let entries = names
            .into_iter()
            .zip(outcomes)
            .map(|(name, joined)| {
                let outcome = joined
                    .unwrap_or_else(|err| TaskOutcome::Failed(format!("task panicked: {err}")));
                (name, outcome)
            })
            .collect();

        let report = FanOutReport { entries };
        report::log_fan_out(&registration.id, &report);
        report
    }

    /// Fire-and-forget variant: the caller's request path returns while
    /// the side effects are still running.
    pub fn spawn_dispatch(self: &Arc<Self>, registration: Registration) -> JoinHandle<FanOutReport> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.dispatch(registration).await })
    }

    async fn run_artifact(this: Arc<Self>, registration: Arc<Registration>) -> TaskOutcome {
        match this.artifacts.generate(&registration.id).await {
            Ok(artifact) => {
                tracing::debug!(event_id = %registration.id, artifact_id = %artifact.id, "artifact generated");
                TaskOutcome::Succeeded
            }
            Err(err) => TaskOutcome::Failed(err.to_string()),
        }
    }

    async fn run_audit(this: Arc<Self>, registration: Arc<Registration>) -> TaskOutcome {
        let payload = AuditPayload::new_registration(&registration);

        match this.audit.record(&registration.id, payload).await {
            Ok(()) => TaskOutcome::Succeeded,
            Err(err) => TaskOutcome::Failed(err.to_string()),
        }
    }

    async fn run_confirmation(this: Arc<Self>, registration: Arc<Registration>) -> TaskOutcome {
        // The confirmation renders with or without the artifact; a
        // failed generation degrades the mail instead of dropping it.
        let artifact = match this.artifacts.generate(&registration.id).await {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                tracing::warn!(event_id = %registration.id, error = %err, "artifact unavailable for confirmation");
                None
            }
        };

        let rendered = content::confirmation(&registration, artifact.as_ref());
        let message = OutboundMessage {
            recipients: vec![registration.email_address.clone()],
            subject: rendered.subject,
            html_body: rendered.html,
            text_body: Some(rendered.text),
        };

        let result = this.engine.send(&message).await;
        report::log_delivery_outcome(TASK_CONFIRMATION, &result);
        outcome_from_delivery(result)
    }

    async fn run_admin_alert(this: Arc<Self>, registration: Arc<Registration>) -> TaskOutcome {
        let rendered = content::admin_alert(&registration);
        let message = OutboundMessage {
            recipients: this.engine.sender().admin_recipients.clone(),
            subject: rendered.subject,
            html_body: rendered.html,
            text_body: Some(rendered.text),
        };

        let result = this.engine.send(&message).await;
        report::log_delivery_outcome(TASK_ADMIN_ALERT, &result);
        outcome_from_delivery(result)
    }
}

/// A delivery counts as failed whenever an error was recorded, even if
/// the result was masked into a caller-visible success.
fn outcome_from_delivery(result: DeliveryResult) -> TaskOutcome {
    match result.error {
        None => TaskOutcome::Succeeded,
        Some(error) => TaskOutcome::Failed(error),
    }
}
