//! Post-registration notification pipeline
//!
//! Once the primary registration transaction has committed and the
//! caller's response has been returned, this crate fans out the
//! follow-up side effects — artifact generation, audit-record
//! persistence, confirmation mail, admin alert — concurrently and
//! failure-isolated, and reports the aggregate outcome through
//! structured logs.

pub mod collaborators;
pub mod content;
pub mod orchestrator;
pub mod report;

pub use collaborators::{ArtifactGenerator, ArtifactRef, AuditPayload, AuditStore};
pub use content::RenderedEmail;
pub use orchestrator::{FanOutReport, Orchestrator, TaskOutcome};
