//! Mail transport implementations
//!
//! The engine talks to the relay through the [`MailTransport`] seam:
//! - `smtp`: lettre-backed pooled SMTP client for production use
//! - `memory`: in-memory transport for tests and local wiring

pub mod memory;
pub mod smtp;

use async_trait::async_trait;
use courier_common::config::SenderIdentity;

use crate::{error::DeliveryError, types::OutboundMessage};

pub use memory::MemoryTransport;
pub use smtp::SmtpTransport;

/// One connection-pooled mail transport.
///
/// Implementations own their pooling; callers must not assume exclusive
/// access to the underlying connections.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Check that the relay is reachable and the credentials are
    /// accepted, without sending anything.
    async fn verify(&self) -> Result<(), DeliveryError>;

    /// Transmit one message, returning the transport's message id.
    async fn send(
        &self,
        sender: &SenderIdentity,
        message: &OutboundMessage,
    ) -> Result<String, DeliveryError>;
}
