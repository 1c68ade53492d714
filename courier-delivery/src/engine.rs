//! The delivery engine: preflight checks, rate limiting, retry

use std::sync::Arc;

use courier_common::config::{ExecutionMode, ResolvedTransport, SenderIdentity};
use tracing::{error, info, warn};

use crate::{
    error::{DeliveryError, PermanentError},
    rate_limiter::RateLimiter,
    retry::RetryPolicy,
    transport::{MailTransport, SmtpTransport},
    types::{DeliveryResult, MAX_RECIPIENTS_PER_MESSAGE, OutboundMessage},
};

/// Long-lived delivery engine owning the pooled transport, the
/// process-wide rate budget, and the retry policy.
///
/// `send` never returns an error; every failure mode is encoded in the
/// returned [`DeliveryResult`]. Construct one engine per process and
/// inject it wherever sends happen — the pool and rate limiter are
/// meant to be contended.
pub struct DeliveryEngine {
    transport: Option<Arc<dyn MailTransport>>,
    /// Diagnostic naming what is missing when `transport` is `None`
    unconfigured: Option<String>,
    sender: SenderIdentity,
    mode: ExecutionMode,
    /// When set (and the mode is not development), a terminal failure
    /// is still reported as `success: true` with `error` populated, so
    /// the triggering business transaction is never failed by a
    /// notification. Operational visibility comes from the logs.
    mask_failures: bool,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl std::fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("configured", &self.transport.is_some())
            .field("mode", &self.mode)
            .field("mask_failures", &self.mask_failures)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl DeliveryEngine {
    /// Build the engine from a resolved transport configuration.
    ///
    /// An unconfigured or unusable transport does not fail
    /// construction; the engine enters the unconfigured state and
    /// `send` reports it per execution mode.
    #[must_use]
    pub fn from_resolved(
        resolved: ResolvedTransport,
        sender: SenderIdentity,
        mode: ExecutionMode,
    ) -> Self {
        let diagnostic = resolved.diagnostic();

        let (transport, unconfigured, limiter) = match resolved {
            ResolvedTransport::Configured(config) => match SmtpTransport::new(&config) {
                Ok(transport) => (
                    Some(Arc::new(transport) as Arc<dyn MailTransport>),
                    None,
                    RateLimiter::new(config.rate_limit_per_interval, config.rate_interval_ms),
                ),
                Err(e) => {
                    error!(error = %e, host = %config.host, "Failed to construct mail transport");
                    (
                        None,
                        Some(format!("mail transport unusable: {e}")),
                        RateLimiter::new(config.rate_limit_per_interval, config.rate_interval_ms),
                    )
                }
            },
            ResolvedTransport::Unconfigured { .. } => (None, diagnostic, default_limiter()),
        };

        Self {
            transport,
            unconfigured,
            sender,
            mode,
            mask_failures: !mode.is_development(),
            retry: RetryPolicy::default(),
            limiter,
        }
    }

    /// Build the engine over an explicit transport (tests, local
    /// wiring with [`crate::MemoryTransport`]).
    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn MailTransport>,
        sender: SenderIdentity,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            transport: Some(transport),
            unconfigured: None,
            sender,
            mode,
            mask_failures: !mode.is_development(),
            retry: RetryPolicy::default(),
            limiter: default_limiter(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the rate budget: `limit` sends per `interval_ms`.
    #[must_use]
    pub fn rate_limit(mut self, limit: u32, interval_ms: u64) -> Self {
        self.limiter = RateLimiter::new(limit, interval_ms);
        self
    }

    /// Set the failure-masking policy explicitly.
    #[must_use]
    pub const fn mask_failures(mut self, mask: bool) -> Self {
        self.mask_failures = mask;
        self
    }

    /// The sender identity stamped onto outgoing mail.
    #[must_use]
    pub const fn sender(&self) -> &SenderIdentity {
        &self.sender
    }

    /// Deliver one message, retrying transient failures with linear
    /// backoff up to the retry budget.
    ///
    /// Never returns an error: configuration problems, preflight
    /// rejections, and exhausted retries all come back as a
    /// [`DeliveryResult`].
    pub async fn send(&self, message: &OutboundMessage) -> DeliveryResult {
        let Some(transport) = &self.transport else {
            return self.unconfigured_result(message);
        };

        if let Err(rejection) = preflight(message) {
            warn!(
                recipient_count = message.recipients.len(),
                subject = %message.subject,
                error = %rejection,
                "Message rejected before delivery"
            );
            return DeliveryResult::rejected(rejection.to_string());
        }

        let mut attempt: u32 = 0;
        loop {
            match self.attempt(transport.as_ref(), message, attempt).await {
                Ok(message_id) => {
                    info!(
                        message_id = %message_id,
                        recipient_count = message.recipients.len(),
                        subject = %message.subject,
                        attempts_made = attempt + 1,
                        "Message delivered"
                    );
                    return DeliveryResult::delivered(message_id, attempt + 1);
                }
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        delivery_attempt = attempt + 1,
                        retry_delay_ms = delay.as_millis(),
                        error = %e,
                        "Delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return self.terminal_failure(&e, attempt + 1, message),
            }
        }
    }

    /// One transmission attempt. The connection is verified before the
    /// first attempt only; a verification failure is classified exactly
    /// like a send failure.
    async fn attempt(
        &self,
        transport: &dyn MailTransport,
        message: &OutboundMessage,
        attempt: u32,
    ) -> Result<String, DeliveryError> {
        if attempt == 0 {
            transport.verify().await?;
        }

        self.limiter.acquire().await;

        transport.send(&self.sender, message).await
    }

    fn unconfigured_result(&self, message: &OutboundMessage) -> DeliveryResult {
        if self.mode.is_development() {
            info!(
                recipients = ?message.recipients,
                subject = %message.subject,
                "Development mode: transport unconfigured, reporting synthetic success"
            );
            return DeliveryResult::development_stub();
        }

        let diagnostic = self
            .unconfigured
            .clone()
            .unwrap_or_else(|| "mail transport not configured".to_string());
        error!(error = %diagnostic, "Cannot deliver: transport unconfigured");
        DeliveryResult::unconfigured(diagnostic)
    }

    fn terminal_failure(
        &self,
        error: &DeliveryError,
        attempts_made: u32,
        message: &OutboundMessage,
    ) -> DeliveryResult {
        error!(
            error = %error,
            attempts_made,
            recipient_count = message.recipients.len(),
            subject = %message.subject,
            "Delivery failed after all retry attempts"
        );

        if self.mask_failures && !self.mode.is_development() {
            DeliveryResult::masked_failure(error.to_string(), attempts_made)
        } else {
            DeliveryResult::failed(error.to_string(), attempts_made)
        }
    }
}

fn default_limiter() -> RateLimiter {
    RateLimiter::new(5, 1000)
}

/// Recipient-count invariant, checked before any network I/O.
fn preflight(message: &OutboundMessage) -> Result<(), DeliveryError> {
    if message.recipients.is_empty() {
        return Err(PermanentError::RecipientList("no recipients specified".to_string()).into());
    }

    if message.recipients.len() > MAX_RECIPIENTS_PER_MESSAGE {
        return Err(PermanentError::RecipientList(format!(
            "{} recipients exceeds the maximum of {MAX_RECIPIENTS_PER_MESSAGE}",
            message.recipients.len()
        ))
        .into());
    }

    Ok(())
}
