//! Pooled SMTP transport backed by lettre

use async_trait::async_trait;
use courier_common::config::{SenderIdentity, TransportConfig};
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{PoolConfig, authentication::Credentials},
};

use crate::{
    error::{DeliveryError, PermanentError},
    transport::MailTransport,
    types::OutboundMessage,
};

/// Long-lived SMTP client over one configured relay.
///
/// Connections are pooled up to `max_connections`; the pool is shared
/// by every caller holding this transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport").finish_non_exhaustive()
    }
}

impl SmtpTransport {
    /// Build a pooled transport from a resolved configuration.
    ///
    /// # Errors
    /// Returns a permanent error when the relay name is unusable.
    pub fn new(config: &TransportConfig) -> Result<Self, DeliveryError> {
        let builder = if config.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.credentials.user.clone(),
                config.credentials.secret.clone(),
            ))
            .pool_config(PoolConfig::new().max_size(config.max_connections))
            .build();

        Ok(Self { transport })
    }

    fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, DeliveryError> {
        let parsed = address.parse::<Address>().map_err(|e| {
            DeliveryError::Permanent(PermanentError::InvalidRecipient(format!("{address}: {e}")))
        })?;
        Ok(Mailbox::new(name.map(String::from), parsed))
    }

    fn build_message(
        sender: &SenderIdentity,
        message: &OutboundMessage,
    ) -> Result<Message, DeliveryError> {
        let mut builder =
            Message::builder().from(Self::mailbox(Some(&sender.from_name), &sender.from_email)?);

        if let Some(reply_to) = &sender.reply_to {
            builder = builder.reply_to(Self::mailbox(None, reply_to)?);
        }

        for recipient in &message.recipients {
            builder = builder.to(Self::mailbox(None, recipient)?);
        }

        builder
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            )
            .map_err(|e| {
                DeliveryError::Permanent(PermanentError::MessageRejected(format!(
                    "failed to assemble message: {e}"
                )))
            })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn verify(&self) -> Result<(), DeliveryError> {
        let reachable = self.transport.test_connection().await?;
        if reachable {
            Ok(())
        } else {
            Err(DeliveryError::Transient(
                crate::error::TransientError::ConnectionFailed(
                    "relay connection verification failed".to_string(),
                ),
            ))
        }
    }

    async fn send(
        &self,
        sender: &SenderIdentity,
        message: &OutboundMessage,
    ) -> Result<String, DeliveryError> {
        let email = Self::build_message(sender, message)?;

        let response = self.transport.send(email).await?;

        Ok(response
            .message()
            .next()
            .map_or_else(|| "accepted".to_string(), ToString::to_string))
    }
}
