//! Message and result types for the delivery engine

use serde::{Deserialize, Serialize};

/// Upper bound on recipients per message; larger lists are rejected
/// before any network activity.
pub const MAX_RECIPIENTS_PER_MESSAGE: usize = 50;

/// One message handed to the delivery engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipient addresses, 1..=[`MAX_RECIPIENTS_PER_MESSAGE`]
    pub recipients: Vec<String>,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html_body: String,
    /// Plain-text body; derived from the HTML body when absent
    #[serde(default)]
    pub text_body: Option<String>,
}

impl OutboundMessage {
    /// Build a message to a single recipient.
    #[must_use]
    pub fn to_one(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            recipients: vec![recipient.into()],
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: None,
        }
    }

    /// The plain-text body, stripping the HTML markup when no text
    /// body was independently authored.
    #[must_use]
    pub fn text_body(&self) -> String {
        self.text_body
            .clone()
            .unwrap_or_else(|| strip_markup(&self.html_body))
    }
}

/// Strip HTML markup from a fragment, collapsing the remaining
/// whitespace. Good enough for a text/plain alternative of mail we
/// rendered ourselves; not a general HTML parser.
#[must_use]
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Terminal projection of one delivery attempt sequence.
///
/// Created by the delivery engine per call and never mutated after
/// return; the caller owns it for logging only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Whether the caller should treat the send as successful. With
    /// failure masking enabled this can be `true` while `error` is
    /// populated; the operational failure is visible through logs.
    pub success: bool,
    /// Transport message id, or a synthetic `dev-`/`failed-` id
    pub message_id: Option<String>,
    /// Terminal error description, when any
    pub error: Option<String>,
    /// Number of transmission attempts actually performed
    pub attempts_made: u32,
    /// Operator-facing annotation of how this result came about
    pub note: Option<String>,
}

impl DeliveryResult {
    pub(crate) fn delivered(message_id: String, attempts_made: u32) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            error: None,
            attempts_made,
            note: None,
        }
    }

    pub(crate) fn development_stub() -> Self {
        Self {
            success: true,
            message_id: Some(format!("dev-{}", unix_millis())),
            error: None,
            attempts_made: 0,
            note: Some("sent in development mode (transport not configured)".to_string()),
        }
    }

    pub(crate) fn unconfigured(diagnostic: String) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(diagnostic),
            attempts_made: 0,
            note: None,
        }
    }

    pub(crate) fn rejected(error: String) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error),
            attempts_made: 0,
            note: None,
        }
    }

    pub(crate) fn failed(error: String, attempts_made: u32) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error),
            attempts_made,
            note: None,
        }
    }

    pub(crate) fn masked_failure(error: String, attempts_made: u32) -> Self {
        Self {
            success: true,
            message_id: Some(format!("failed-{}", unix_millis())),
            error: Some(error),
            attempts_made,
            note: Some("delivery failed after all retry attempts".to_string()),
        }
    }
}

fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_body_prefers_authored_text() {
        let message = OutboundMessage {
            recipients: vec!["a@x.com".to_string()],
            subject: "S".to_string(),
            html_body: "<p>hello</p>".to_string(),
            text_body: Some("authored".to_string()),
        };
        assert_eq!(message.text_body(), "authored");
    }

    #[test]
    fn text_body_derives_from_html() {
        let message = OutboundMessage::to_one("a@x.com", "S", "<p>hi <b>there</b></p>");
        assert_eq!(message.text_body(), "hi there");
    }

    #[test]
    fn strip_markup_collapses_whitespace_and_entities() {
        let html = "<div>\n  <h1>Hello</h1>\n  <p>one&nbsp;&amp;\n two</p>\n</div>";
        assert_eq!(strip_markup(html), "Hello one & two");
    }

    #[test]
    fn strip_markup_leaves_plain_text_alone() {
        assert_eq!(strip_markup("just words"), "just words");
    }
}
