//! In-memory transport for tests and local wiring
//!
//! Records every accepted message instead of touching the network.
//! Always succeeds; failure injection belongs to test-local mocks.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use courier_common::config::SenderIdentity;
use parking_lot::Mutex;

use crate::{error::DeliveryError, transport::MailTransport, types::OutboundMessage};

/// One message accepted by a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub from: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Transport that records messages in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<SentMail>>>,
    counter: Arc<AtomicUsize>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages accepted so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Snapshot of everything accepted so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn verify(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn send(
        &self,
        sender: &SenderIdentity,
        message: &OutboundMessage,
    ) -> Result<String, DeliveryError> {
        let sequence = self.counter.fetch_add(1, Ordering::SeqCst);

        self.sent.lock().push(SentMail {
            from: sender.from_header(),
            recipients: message.recipients.clone(),
            subject: message.subject.clone(),
            html_body: message.html_body.clone(),
            text_body: message.text_body(),
        });

        Ok(format!("<memory-{sequence}@localhost>"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_messages_in_order() {
        let transport = MemoryTransport::new();
        let sender = SenderIdentity::from_lookup(|_| None);

        let first = transport
            .send(&sender, &OutboundMessage::to_one("a@x.com", "one", "<p>1</p>"))
            .await
            .unwrap();
        let second = transport
            .send(&sender, &OutboundMessage::to_one("b@x.com", "two", "<p>2</p>"))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(transport.count(), 2);

        let sent = transport.sent();
        assert_eq!(sent[0].subject, "one");
        assert_eq!(sent[1].recipients, vec!["b@x.com"]);
        assert_eq!(sent[1].text_body, "2");
    }
}
