//! Environment-driven configuration.
//!
//! Values are read from the process environment once at startup. A `.env`
//! file in the working directory is honoured but never overrides variables
//! that are already set.

use std::str::FromStr;

use crate::errors::{AppError, AppResult};

/// Default Cloud SQL Admin API base URL.
pub const DEFAULT_SQLADMIN_ENDPOINT: &str = "https://sqladmin.googleapis.com/sql/v1beta4";

/// Process-level configuration shared by every service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    /// Emit JSON log lines instead of human-readable text.
    pub log_json: bool,
    pub google: GoogleConfig,
}

/// Project, endpoint and credential settings for Google APIs.
///
/// Without static tokens, credentials come from Application Default
/// Credentials (`GOOGLE_APPLICATION_CREDENTIALS`, the gcloud well-known file,
/// then the metadata server).
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub project: Option<String>,
    pub sqladmin_endpoint: String,
    pub static_access_token: Option<String>,
    pub static_identity_token: Option<String>,
}

impl AppConfig {
    /// Loads configuration for the named service.
    pub fn load_with_service(service_name: &str) -> AppResult<Self> {
        load_dotenv();
        Ok(Self {
            service_name: service_name.to_string(),
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_parse("SERVER_PORT", 8080)?,
            log_json: env_opt("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            google: GoogleConfig {
                project: env_opt("SQLADMIN_PROJECT"),
                sqladmin_endpoint: env_or("SQLADMIN_ENDPOINT", DEFAULT_SQLADMIN_ENDPOINT),
                static_access_token: env_opt("SQLADMIN_ACCESS_TOKEN"),
                static_identity_token: env_opt("SQLADMIN_IDENTITY_TOKEN"),
            },
        })
    }

    /// Listen address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the configured project or a configuration error.
    pub fn require_project(&self) -> AppResult<String> {
        self.google
            .project
            .clone()
            .ok_or_else(|| AppError::Config("SQLADMIN_PROJECT is not set".to_string()))
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            tracing::warn!(error = %err, "failed to read .env file");
        }
    }
}

/// Reads a variable, treating empty values as unset.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads a variable with a fallback.
pub fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Reads and parses a variable, falling back when unset.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

/// Reads a required variable.
pub fn env_required(key: &str) -> AppResult<String> {
    env_opt(key).ok_or_else(|| AppError::Config(format!("{key} is not set")))
}

/// Reads a comma-separated list, dropping empty entries.
pub fn env_list(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
