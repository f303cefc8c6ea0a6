//! Contact form records and validation

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{ClientError, Result};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Check an address has the `<local>@<domain>.<tld>` shape.
///
/// ASCII only, no whitespace, exactly one `@`, and at least one `.` after it
/// with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    email.is_ascii() && email_regex().is_match(email)
}

/// A contact form as entered by the visitor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Validate the form before it touches the network or local storage
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            tracing::debug!(fields = ?missing, "contact form has empty fields");
            return Err(ClientError::validation("All fields are required"));
        }

        if !is_valid_email(&self.email) {
            return Err(ClientError::validation("Invalid email format"));
        }

        Ok(())
    }
}

/// A contact form stamped with the time it was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// ISO-8601 UTC timestamp with millisecond precision
    pub timestamp: String,
}

impl ContactSubmission {
    /// Stamp a form with the current time
    pub fn from_form(form: ContactForm) -> Self {
        Self::at(form, Utc::now())
    }

    /// Stamp a form with the given time
    pub fn at(form: ContactForm, at: DateTime<Utc>) -> Self {
        Self {
            name: form.name,
            email: form.email,
            subject: form.subject,
            message: form.message,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Parse the stored timestamp
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}
