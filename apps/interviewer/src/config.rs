use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    /// Override for the Gemini REST base URL (proxies, local mocks).
    pub gemini_api_base: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'GEMINI_API_KEY' is not set")?;

        let port = parse_or("PORT", lookup("PORT"), 8080u16)?;
        let timeout_secs = parse_or("LLM_TIMEOUT_SECS", lookup("LLM_TIMEOUT_SECS"), 45u64)?;
        if !(1..=300).contains(&timeout_secs) {
            bail!("LLM_TIMEOUT_SECS must be between 1 and 300, got {timeout_secs}");
        }
        let llm_max_attempts = parse_or("LLM_MAX_ATTEMPTS", lookup("LLM_MAX_ATTEMPTS"), 3u32)?;
        if llm_max_attempts == 0 {
            bail!("LLM_MAX_ATTEMPTS must be at least 1");
        }
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            lookup("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        Ok(Config {
            gemini_api_key,
            gemini_api_base: lookup("GEMINI_API_BASE").filter(|v| !v.trim().is_empty()),
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            llm_timeout: Duration::from_secs(timeout_secs),
            llm_max_attempts,
            max_upload_bytes,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}
