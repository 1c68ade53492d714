//! Resilient outbound mail delivery
//!
//! This crate provides the single-message delivery primitive of the
//! courier pipeline:
//! - A pooled, rate-limited transport to one configured relay
//! - Transient/permanent failure classification
//! - Retry with linear backoff for transient failures
//! - All outcomes returned as data; `send` never fails the caller

mod engine;
mod error;
mod rate_limiter;
mod retry;
pub mod transport;
mod types;

pub use engine::DeliveryEngine;
pub use error::{DeliveryError, PermanentError, TransientError};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use transport::{MailTransport, MemoryTransport, SmtpTransport};
pub use types::{
    DeliveryResult, MAX_RECIPIENTS_PER_MESSAGE, OutboundMessage, strip_markup,
};
