//! The registration record produced by the primary business transaction
//!
//! The record arrives fully persisted; the pipeline only reads it to
//! render notification content and audit payloads.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A committed participant registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Primary key of the persisted record
    pub id: String,
    /// Participant name
    pub full_name: String,
    /// Participant contact address; confirmation mail goes here
    pub email_address: String,
    /// Participant date of birth
    pub date_of_birth: NaiveDate,
    /// Optional form fields; the content builders render placeholders
    /// when these are absent
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub parent_guardian_name: Option<String>,
    /// When the primary transaction committed
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Age in whole years as of the given date.
    ///
    /// Takes the reference date as input so callers stay deterministic;
    /// the content builders pass the registration date.
    #[must_use]
    pub fn age_on(&self, date: NaiveDate) -> i32 {
        let mut age = date.year() - self.date_of_birth.year();
        if (date.month(), date.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }
        age
    }
}
