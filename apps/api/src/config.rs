use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on a single update-planner call. Elapsed = no merge, nothing persisted.
    pub planner_timeout: Duration,
    /// Longest free-text update accepted by `POST /resumes/:id/update-smart`.
    pub max_update_text_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            planner_timeout: Duration::from_secs(
                parse_env("PLANNER_TIMEOUT_SECS", 60)
                    .context("PLANNER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            max_update_text_chars: parse_env("MAX_UPDATE_TEXT_CHARS", 5000)
                .context("MAX_UPDATE_TEXT_CHARS must be a positive integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
