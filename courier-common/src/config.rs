//! Transport and sender configuration
//!
//! Configuration is resolved once from the environment into immutable
//! values. An absent host or missing credentials does not produce an
//! error here; it yields [`ResolvedTransport::Unconfigured`] naming the
//! missing variables, and the delivery engine decides what that means
//! for the current [`ExecutionMode`].

use serde::{Deserialize, Serialize};

/// Authentication material for the mail transport.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Username presented to the relay
    pub user: String,
    /// Password or app token presented to the relay
    pub secret: String,
}

// Manual Debug so the secret never lands in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Connection descriptor for the outbound mail relay.
///
/// Immutable once resolved. Pool and rate-limit bounds are process-wide:
/// every delivery engine invocation contends for the same budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Relay hostname
    pub host: String,

    /// Relay port
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Whether the relay expects implicit TLS (typically port 465)
    /// rather than STARTTLS
    #[serde(default)]
    pub implicit_tls: bool,

    /// Authentication material
    pub credentials: Credentials,

    /// Maximum pooled connections to the relay
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,

    /// Maximum messages sent over one pooled connection before it is
    /// recycled
    #[serde(default = "defaults::max_messages_per_connection")]
    pub max_messages_per_connection: u32,

    /// Length of one rate-limit window, in milliseconds
    #[serde(default = "defaults::rate_interval_ms")]
    pub rate_interval_ms: u64,

    /// Maximum sends permitted per window, across the whole process
    #[serde(default = "defaults::rate_limit_per_interval")]
    pub rate_limit_per_interval: u32,
}

mod defaults {
    pub const fn port() -> u16 {
        587
    }

    pub const fn max_connections() -> u32 {
        5
    }

    pub const fn max_messages_per_connection() -> u32 {
        100
    }

    pub const fn rate_interval_ms() -> u64 {
        1000
    }

    pub const fn rate_limit_per_interval() -> u32 {
        5
    }
}

/// Outcome of transport configuration resolution.
#[derive(Debug, Clone)]
pub enum ResolvedTransport {
    /// A complete connection descriptor
    Configured(TransportConfig),
    /// One or more required settings were absent
    Unconfigured {
        /// Names of the missing environment variables
        missing: Vec<&'static str>,
    },
}

impl ResolvedTransport {
    /// Human-readable diagnostic for the unconfigured case.
    #[must_use]
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Configured(_) => None,
            Self::Unconfigured { missing } => Some(format!(
                "mail transport not configured, missing: {}",
                missing.join(", ")
            )),
        }
    }
}

/// Resolve the transport configuration from the process environment.
///
/// | Variable               | Required | Default |
/// |------------------------|----------|---------|
/// | `SMTP_HOST`            | yes      | —       |
/// | `SMTP_PORT`            | no       | `587`   |
/// | `SMTP_SECURE`          | no       | implied by port 465 |
/// | `SMTP_USER`            | yes      | —       |
/// | `SMTP_PASS`            | yes      | —       |
/// | `SMTP_MAX_CONNECTIONS` | no       | `5`     |
/// | `SMTP_MAX_MESSAGES`    | no       | `100`   |
/// | `SMTP_RATE_INTERVAL_MS`| no       | `1000`  |
/// | `SMTP_RATE_LIMIT`      | no       | `5`     |
#[must_use]
pub fn resolve_transport_config() -> ResolvedTransport {
    resolve_transport_from(|key| std::env::var(key).ok())
}

/// Resolve the transport configuration through an arbitrary lookup,
/// so resolution is testable without touching process state.
pub fn resolve_transport_from(lookup: impl Fn(&str) -> Option<String>) -> ResolvedTransport {
    let mut missing = Vec::new();

    let host = lookup("SMTP_HOST");
    let user = lookup("SMTP_USER");
    let secret = lookup("SMTP_PASS");

    if host.is_none() {
        missing.push("SMTP_HOST");
    }
    if user.is_none() {
        missing.push("SMTP_USER");
    }
    if secret.is_none() {
        missing.push("SMTP_PASS");
    }

    let (Some(host), Some(user), Some(secret)) = (host, user, secret) else {
        return ResolvedTransport::Unconfigured { missing };
    };

    let port = lookup("SMTP_PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(defaults::port);

    let implicit_tls = lookup("SMTP_SECURE").is_some_and(|v| v == "true" || v == "1") || port == 465;

    ResolvedTransport::Configured(TransportConfig {
        host,
        port,
        implicit_tls,
        credentials: Credentials { user, secret },
        max_connections: lookup("SMTP_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(defaults::max_connections),
        max_messages_per_connection: lookup("SMTP_MAX_MESSAGES")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(defaults::max_messages_per_connection),
        rate_interval_ms: lookup("SMTP_RATE_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(defaults::rate_interval_ms),
        rate_limit_per_interval: lookup("SMTP_RATE_LIMIT")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(defaults::rate_limit_per_interval),
    })
}

/// Identity stamped onto every outgoing message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderIdentity {
    /// Display name for the From header
    pub from_name: String,
    /// From address
    pub from_email: String,
    /// Reply-To address, when distinct from the sender
    pub reply_to: Option<String>,
    /// Addresses that receive admin alerts
    pub admin_recipients: Vec<String>,
}

impl SenderIdentity {
    /// Resolve the sender identity from the environment
    /// (`EMAIL_FROM_NAME`, `EMAIL_FROM_ADDRESS`, `EMAIL_REPLY_TO`,
    /// `ADMIN_EMAILS` comma-separated).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the sender identity through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let from_email = lookup("EMAIL_FROM_ADDRESS")
            .or_else(|| lookup("SMTP_USER"))
            .unwrap_or_else(|| "noreply@localhost".to_string());

        Self {
            from_name: lookup("EMAIL_FROM_NAME").unwrap_or_else(|| "Registrations".to_string()),
            from_email,
            reply_to: lookup("EMAIL_REPLY_TO"),
            admin_recipients: lookup("ADMIN_EMAILS").map_or_else(
                || vec!["admin@localhost".to_string()],
                |v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                },
            ),
        }
    }

    /// The From header value, `"Name" <address>`.
    #[must_use]
    pub fn from_header(&self) -> String {
        format!("\"{}\" <{}>", self.from_name, self.from_email)
    }
}

/// Execution mode gating the synthetic-success and failure-masking
/// behaviors of the delivery engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Local development: unconfigured transport yields synthetic
    /// successes, failures are never masked
    Development,
    /// Anything else
    Production,
}

impl ExecutionMode {
    /// Resolve the execution mode from `COURIER_ENV`, falling back to
    /// the build profile.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(std::env::var("COURIER_ENV").ok().as_deref())
    }

    /// Parse a mode string; anything other than `development`/`dev`
    /// is production, and an absent value follows the build profile.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("development" | "dev") => Self::Development,
            Some(_) => Self::Production,
            None => {
                if cfg!(debug_assertions) {
                    Self::Development
                } else {
                    Self::Production
                }
            }
        }
    }

    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn resolves_complete_configuration_with_defaults() {
        let resolved = resolve_transport_from(env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASS", "hunter2"),
        ]));

        let ResolvedTransport::Configured(config) = resolved else {
            panic!("expected configured transport");
        };
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 587);
        assert!(!config.implicit_tls);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.max_messages_per_connection, 100);
        assert_eq!(config.rate_interval_ms, 1000);
        assert_eq!(config.rate_limit_per_interval, 5);
    }

    #[test]
    fn port_465_implies_implicit_tls() {
        let resolved = resolve_transport_from(env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASS", "hunter2"),
        ]));

        let ResolvedTransport::Configured(config) = resolved else {
            panic!("expected configured transport");
        };
        assert_eq!(config.port, 465);
        assert!(config.implicit_tls);
    }

    #[test]
    fn missing_credentials_name_every_absent_variable() {
        let resolved = resolve_transport_from(env(&[("SMTP_HOST", "smtp.example.com")]));

        let ResolvedTransport::Unconfigured { missing } = &resolved else {
            panic!("expected unconfigured transport");
        };
        assert_eq!(*missing, vec!["SMTP_USER", "SMTP_PASS"]);

        let diagnostic = resolved.diagnostic().unwrap();
        assert!(diagnostic.contains("SMTP_USER"));
        assert!(diagnostic.contains("SMTP_PASS"));
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let credentials = Credentials {
            user: "mailer".to_string(),
            secret: "hunter2".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("mailer"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn sender_identity_splits_admin_recipients() {
        let identity = SenderIdentity::from_lookup(env(&[
            ("EMAIL_FROM_NAME", "Youth Camp"),
            ("EMAIL_FROM_ADDRESS", "noreply@example.com"),
            ("ADMIN_EMAILS", "one@example.com, two@example.com"),
        ]));

        assert_eq!(identity.from_header(), "\"Youth Camp\" <noreply@example.com>");
        assert_eq!(
            identity.admin_recipients,
            vec!["one@example.com", "two@example.com"]
        );
    }

    #[test]
    fn execution_mode_parsing() {
        assert_eq!(
            ExecutionMode::parse(Some("development")),
            ExecutionMode::Development
        );
        assert_eq!(ExecutionMode::parse(Some("dev")), ExecutionMode::Development);
        assert_eq!(
            ExecutionMode::parse(Some("production")),
            ExecutionMode::Production
        );
        assert_eq!(ExecutionMode::parse(Some("staging")), ExecutionMode::Production);
        assert!(ExecutionMode::Development.is_development());
        assert!(!ExecutionMode::Production.is_development());
    }
}
