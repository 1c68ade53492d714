//! External collaborators of the fan-out orchestrator
//!
//! The orchestrator only needs these seams; their real implementations
//! (a scannable-code generator, the application database) live with the
//! surrounding application.

use async_trait::async_trait;
use courier_common::Registration;
use serde::Serialize;
use serde_json::json;

/// Reference to a generated artifact (e.g. a check-in code image).
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    /// Identifier of the artifact
    pub id: String,
    /// Renderable payload, e.g. a data URL
    pub data: String,
}

/// Generates the per-registration artifact.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    async fn generate(&self, event_id: &str) -> anyhow::Result<ArtifactRef>;
}

/// Persists audit/notification records. Fire-and-forget from the
/// pipeline's perspective; failures are captured by the orchestrator
/// and never propagated.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record(&self, event_id: &str, payload: AuditPayload) -> anyhow::Result<()>;
}

/// The audit record written for one registration event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPayload {
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub priority: &'static str,
    pub metadata: serde_json::Value,
}

impl AuditPayload {
    /// The record persisted when a new registration arrives.
    #[must_use]
    pub fn new_registration(registration: &Registration) -> Self {
        Self {
            kind: "new_registration",
            title: "New Registration".to_string(),
            message: format!("{} has registered", registration.full_name),
            priority: "medium",
            metadata: json!({
                "registrationId": registration.id,
                "participantName": registration.full_name,
                "participantEmail": registration.email_address,
                "participantPhone": registration.phone_number,
                "parentGuardian": registration.parent_guardian_name,
                "registrationDate": registration.created_at,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    #[test]
    fn new_registration_payload_carries_the_record() {
        let registration = Registration {
            id: "reg-42".to_string(),
            full_name: "Jordan Doe".to_string(),
            email_address: "jordan@example.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2010, 6, 15).unwrap(),
            gender: None,
            address: None,
            phone_number: Some("555-0100".to_string()),
            parent_guardian_name: None,
            created_at: Utc::now(),
        };

        let payload = AuditPayload::new_registration(&registration);

        assert_eq!(payload.kind, "new_registration");
        assert!(payload.message.contains("Jordan Doe"));
        assert_eq!(payload.metadata["registrationId"], "reg-42");
        assert_eq!(payload.metadata["participantPhone"], "555-0100");
        assert_eq!(payload.metadata["parentGuardian"], serde_json::Value::Null);
    }
}
