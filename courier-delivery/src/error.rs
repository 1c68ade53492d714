//! Typed error handling for delivery operations
//!
//! The taxonomy drives the retry decision:
//! - Transient failures (network/timeout class) are retried with backoff
//! - Permanent failures (auth, malformed recipient, rejection) never are
//! - An unconfigured transport is terminal without any attempt

use thiserror::Error;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Failure plausibly resolved by retrying.
    #[error("Transient failure: {0}")]
    Transient(#[from] TransientError),

    /// Failure that retrying cannot fix.
    #[error("Permanent failure: {0}")]
    Permanent(#[from] PermanentError),
}

/// Transient errors, retried with backoff.
#[derive(Debug, Error)]
pub enum TransientError {
    /// Failed to establish or keep a connection to the relay.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation against the relay timed out.
    #[error("Connection timed out: {0}")]
    Timeout(String),

    /// The relay returned a temporary (4xx) response.
    #[error("Temporary SMTP error: {0}")]
    SmtpTemporary(String),
}

/// Permanent errors, never retried.
#[derive(Debug, Error)]
pub enum PermanentError {
    /// Relay authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A recipient or sender address could not be parsed.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The recipient list is empty or exceeds the per-message bound.
    #[error("Recipient list rejected: {0}")]
    RecipientList(String),

    /// The relay rejected the message (5xx), or the error could not be
    /// classified.
    #[error("Message rejected: {0}")]
    MessageRejected(String),
}

impl DeliveryError {
    /// Returns `true` if this error should be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns `true` if this error should not be retried.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Classify an SMTP transport error.
///
/// - 4xx responses and network/timeout errors are transient
/// - 5xx responses are permanent rejections
/// - Anything unclassified is treated as permanent, matching the
///   retry policy's conservative default
impl From<lettre::transport::smtp::Error> for DeliveryError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        if error.is_transient() {
            return Self::Transient(TransientError::SmtpTemporary(error.to_string()));
        }

        if error.is_permanent() {
            return Self::Permanent(PermanentError::MessageRejected(error.to_string()));
        }

        if error.is_timeout() {
            return Self::Transient(TransientError::Timeout(error.to_string()));
        }

        // No response code to go by; fall back to the error text the
        // way the network stack describes connection-class failures.
        let text = format!("{error}");
        let lowered = text.to_lowercase();
        if lowered.contains("timeout")
            || lowered.contains("timed out")
            || lowered.contains("connection")
            || lowered.contains("network")
            || lowered.contains("reset")
        {
            Self::Transient(TransientError::ConnectionFailed(text))
        } else {
            Self::Permanent(PermanentError::MessageRejected(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let error = DeliveryError::Transient(TransientError::ConnectionFailed(
            "connection reset by peer".to_string(),
        ));
        assert!(error.is_transient());
        assert!(!error.is_permanent());
    }

    #[test]
    fn permanent_classification() {
        let error = DeliveryError::Permanent(PermanentError::AuthenticationFailed(
            "535 bad credentials".to_string(),
        ));
        assert!(error.is_permanent());
        assert!(!error.is_transient());
    }

    #[test]
    fn error_display() {
        let error = DeliveryError::Transient(TransientError::Timeout("read timed out".to_string()));
        assert_eq!(
            error.to_string(),
            "Transient failure: Connection timed out: read timed out"
        );

        let error = DeliveryError::Permanent(PermanentError::RecipientList(
            "51 recipients exceeds the maximum of 50".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Permanent failure: Recipient list rejected: 51 recipients exceeds the maximum of 50"
        );
    }
}
