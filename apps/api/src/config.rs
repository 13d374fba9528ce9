use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_UPLOAD_LIMIT_BYTES: u64 = 16 * 1024 * 1024;
const DEFAULT_FETCH_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to each component's constructor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Opaque credential for the generative-AI service. Only the LLM client reads it.
    pub ai_credential: Option<String>,
    pub ai_model: String,
    pub ai_base_url: String,
    pub ai_service_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    /// Largest job page body the fetcher will read.
    pub fetch_max_bytes: usize,
    pub storage_root: PathBuf,
    pub upload_size_limit_bytes: u64,
    /// Lower-cased, without the leading dot.
    pub accepted_extensions: BTreeSet<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            ai_credential: optional_env("GOOGLE_API_KEY"),
            ai_model: optional_env("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            ai_base_url: optional_env("AI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            ai_service_timeout_ms: parse_env("AI_TIMEOUT_MS", 60_000)?,
            fetch_timeout_ms: parse_env("FETCH_TIMEOUT_MS", 15_000)?,
            fetch_max_bytes: parse_env("FETCH_MAX_BYTES", DEFAULT_FETCH_MAX_BYTES)?,
            storage_root: PathBuf::from(
                optional_env("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            ),
            upload_size_limit_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_UPLOAD_LIMIT_BYTES)?,
            accepted_extensions: optional_env("ACCEPTED_EXTENSIONS")
                .map(|raw| parse_extensions(&raw))
                .unwrap_or_else(default_extensions),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_service_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

pub fn default_extensions() -> BTreeSet<String> {
    BTreeSet::from(["docx".to_string()])
}

/// Parses a comma-separated extension list such as `"docx, .DOC"` into `{"docx", "doc"}`.
pub fn parse_extensions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
