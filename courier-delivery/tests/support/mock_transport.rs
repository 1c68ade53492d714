//! Scripted mail transport for exercising engine failure handling
//!
//! The engine delegates the wire protocol to the transport seam, so
//! failure scenarios are injected there: a configurable number of
//! transient send failures, an always-permanent rejection, or failing
//! connection verification. Call counters allow asserting how many
//! network operations the engine actually performed.
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use courier_common::config::SenderIdentity;
use courier_delivery::{
    DeliveryError, MailTransport, OutboundMessage, PermanentError, TransientError,
};

#[derive(Default)]
pub struct MockTransportBuilder {
    transient_failures: usize,
    permanent_failure: Option<String>,
    verify_failures: usize,
}

impl MockTransportBuilder {
    /// Fail the first `count` sends with a connection-reset class error.
    #[must_use]
    pub fn transient_failures(mut self, count: usize) -> Self {
        self.transient_failures = count;
        self
    }

    /// Fail every send with a permanent rejection.
    #[must_use]
    pub fn permanent_failure(mut self, message: impl Into<String>) -> Self {
        self.permanent_failure = Some(message.into());
        self
    }

    /// Fail the first `count` verification calls with a timeout.
    #[must_use]
    pub fn verify_failures(mut self, count: usize) -> Self {
        self.verify_failures = count;
        self
    }

    pub fn build(self) -> Arc<MockTransport> {
        Arc::new(MockTransport {
            transient_failures: self.transient_failures,
            permanent_failure: self.permanent_failure,
            verify_failures: self.verify_failures,
            send_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        })
    }
}

pub struct MockTransport {
    transient_failures: usize,
    permanent_failure: Option<String>,
    verify_failures: usize,
    send_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::default()
    }

    /// Transport that accepts everything.
    pub fn always_succeeds() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn verify(&self) -> Result<(), DeliveryError> {
        let call = self.verify_calls.fetch_add(1, Ordering::SeqCst);

        if call < self.verify_failures {
            return Err(DeliveryError::Transient(TransientError::Timeout(
                "connect timed out".to_string(),
            )));
        }

        Ok(())
    }

    async fn send(
        &self,
        _sender: &SenderIdentity,
        _message: &OutboundMessage,
    ) -> Result<String, DeliveryError> {
        let call = self.send_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.permanent_failure {
            return Err(DeliveryError::Permanent(PermanentError::MessageRejected(
                message.clone(),
            )));
        }

        if call < self.transient_failures {
            return Err(DeliveryError::Transient(TransientError::ConnectionFailed(
                "connection reset by peer".to_string(),
            )));
        }

        Ok(format!("<mock-{call}@relay.test>"))
    }
}
