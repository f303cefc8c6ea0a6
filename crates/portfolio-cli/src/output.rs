//! Output formatting for the portfolio CLI

use colored::Colorize;
use portfolio_client::{ClientError, ContactSubmission};
use serde::Serialize;
use serde_json::Value;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation succeeded
    Success = 0,
    /// Backend unavailable where availability was the question
    Offline = 1,
    /// The contact form failed validation
    InvalidInput = 2,
    /// The backend rejected the request
    ApiError = 3,
    /// The backend could not be reached
    NetworkError = 4,
    /// Local storage could not be read or written
    StorageError = 5,
    /// Anything else
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::Validation(_) => ExitCode::InvalidInput,
            ClientError::Api { .. } | ClientError::Parse(_) => ExitCode::ApiError,
            ClientError::Network(_) | ClientError::Offline => ExitCode::NetworkError,
            ClientError::Storage(_) => ExitCode::StorageError,
            ClientError::Config(_) | ClientError::Metrics(_) => ExitCode::InternalError,
        }
    }
}

#[derive(Serialize)]
struct JsonOut<'a, T: Serialize> {
    ok: bool,
    data: &'a T,
}

/// Print a JSON value, wrapped in an `{ok, data}` envelope when `json` is set
pub fn print_value(json: bool, label: &str, value: &Value) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data: value })?
        );
    } else {
        println!("{}: {}", label.bold(), serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

pub fn print_mode(json: bool, api_base: &str, enabled: bool) -> anyhow::Result<()> {
    if json {
        let data = serde_json::json!({ "api_base": api_base, "enabled": enabled });
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data: &data })?
        );
    } else if enabled {
        println!("{} backend available at {}", "✓".green(), api_base);
    } else {
        println!("{} backend unavailable at {}, offline mode", "⚠".yellow(), api_base);
    }
    Ok(())
}

pub fn print_error(json: bool, err: &ClientError) {
    if json {
        let body = serde_json::json!({ "ok": false, "error": err.to_string() });
        println!("{}", body);
    } else {
        eprintln!("{} {}", "✗ Error:".red().bold(), err);
        if err.is_retryable() {
            eprintln!("  please try again later");
        }
    }
}

pub fn print_submissions(json: bool, entries: &[ContactSubmission]) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data: &entries })?
        );
        return Ok(());
    }

    if entries.is_empty() {
        println!("no offline submissions");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}\t{}\t{}\t{}",
            entry.timestamp.dimmed(),
            entry.name,
            entry.email,
            entry.subject
        );
    }
    Ok(())
}
