//! Structured outcome reporting
//!
//! Every delivery and fan-out run emits one summary event here, so the
//! pipeline is observable from logs alone.

use courier_delivery::DeliveryResult;

use crate::orchestrator::{FanOutReport, TaskOutcome};

/// Emit the outcome of a single delivery attempt series.
pub fn log_delivery_outcome(task: &str, result: &DeliveryResult) {
    if result.error.is_none() {
        tracing::event!(
            tracing::Level::INFO,
            task,
            message_id = result.message_id.as_deref(),
            attempts = result.attempts_made,
            note = result.note.as_deref(),
            "delivery succeeded"
        );
    } else {
        tracing::event!(
            tracing::Level::WARN,
            task,
            reported_success = result.success,
            attempts = result.attempts_made,
            error = result.error.as_deref(),
            "delivery failed"
        );
    }
}

/// Emit the aggregate outcome of one fan-out run.
pub fn log_fan_out(event_id: &str, report: &FanOutReport) {
    let failed = report.failures();

    if failed == 0 {
        tracing::event!(
            tracing::Level::INFO,
            event_id,
            tasks = report.len(),
            "all post-registration tasks completed"
        );
        return;
    }

    for (task, outcome) in report.iter() {
        if let TaskOutcome::Failed(reason) = outcome {
            tracing::event!(
                tracing::Level::WARN,
                event_id,
                task = *task,
                reason = reason.as_str(),
                "task failed"
            );
        }
    }

    tracing::event!(
        tracing::Level::WARN,
        event_id,
        tasks = report.len(),
        failed,
        "post-registration fan-out completed with failures"
    );
}
