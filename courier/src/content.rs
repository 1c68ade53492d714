//! Notification content builders
//!
//! Pure rendering of message bodies from a registration record: no
//! I/O, no clock reads, deterministic for identical inputs. Optional
//! form fields render a placeholder instead of failing.

use courier_common::Registration;
use courier_delivery::strip_markup;

use crate::collaborators::ArtifactRef;

/// A rendered message, ready to wrap into an
/// [`courier_delivery::OutboundMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

const PLACEHOLDER: &str = "Not provided";

fn field(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => PLACEHOLDER,
    }
}

fn info_row(label: &str, value: &str) -> String {
    format!(
        r#"<div class="info-item"><div class="info-label">{label}</div><div class="info-value">{value}</div></div>"#
    )
}

/// Confirmation sent to the participant, embedding the check-in
/// artifact when one is available.
#[must_use]
pub fn confirmation(registration: &Registration, artifact: Option<&ArtifactRef>) -> RenderedEmail {
    let subject = "Registration Confirmed - Your Check-in Code".to_string();

    let artifact_section = artifact.map_or_else(
        || {
            "<p>Your check-in code will be available from the registration desk.</p>".to_string()
        },
        |artifact| {
            format!(
                r#"<div class="artifact"><img src="{}" alt="Check-in code" width="200" height="200" /><p>Code reference: {}</p></div>"#,
                artifact.data, artifact.id
            )
        },
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<body>
<div class="container">
<div class="header"><h1>Registration Confirmed!</h1></div>
<div class="content">
<h2>Hello {full_name}!</h2>
<p>Your registration has been successfully completed. Save this message and bring your check-in code to the event.</p>
{artifact_section}
<div class="info-grid">
{registered}
{email}
{phone}
{gender}
</div>
<p>We're excited to see you at the event. Contact the support team with any questions.</p>
</div>
<div class="footer"><p>This is an automated message. Please do not reply to this email.</p></div>
</div>
</body>
</html>"#,
        full_name = registration.full_name,
        registered = info_row(
            "Registration Date",
            &registration.created_at.format("%Y-%m-%d").to_string()
        ),
        email = info_row("Email Address", &registration.email_address),
        phone = info_row("Phone Number", field(registration.phone_number.as_deref())),
        gender = info_row("Gender", field(registration.gender.as_deref())),
    );

    let text = strip_markup(&html);

    RenderedEmail {
        subject,
        html,
        text,
    }
}

/// Alert sent to the admin recipients when a new registration lands.
#[must_use]
pub fn admin_alert(registration: &Registration) -> RenderedEmail {
    let subject = format!("New Registration: {}", registration.full_name);

    let age = registration.age_on(registration.created_at.date_naive());

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<body>
<div class="container">
<div class="header"><h1>New Registration Received</h1><p>A new participant has registered</p></div>
<div class="content">
<div class="info-grid">
{name}
{email}
{phone}
{age}
{guardian}
{registered}
</div>
<div class="summary">
<p><strong>Registration ID:</strong> {id}</p>
<p><strong>Address:</strong> {address}</p>
</div>
</div>
<div class="footer"><p>Automated notification from the registration system. Do not reply.</p></div>
</div>
</body>
</html>"#,
        name = info_row("Participant Name", &registration.full_name),
        email = info_row("Email Address", &registration.email_address),
        phone = info_row("Phone Number", field(registration.phone_number.as_deref())),
        age = info_row("Age", &format!("{age} years old")),
        guardian = info_row(
            "Parent/Guardian",
            field(registration.parent_guardian_name.as_deref())
        ),
        registered = info_row(
            "Registration Date",
            &registration.created_at.format("%Y-%m-%d").to_string()
        ),
        id = registration.id,
        address = field(registration.address.as_deref()),
    );

    let text = strip_markup(&html);

    RenderedEmail {
        subject,
        html,
        text,
    }
}
