use anyhow::{Context, Result};
use serde::Deserialize;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Configuration for the connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
    pub setlist: SetlistConfig,
    pub completion: CompletionConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SetlistConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>, // e.g. "SETLIST_API_KEY"
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_setlist_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>, // e.g. "OPENAI_API_KEY"
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    /// Character budget for the context sent per request.
    #[serde(default = "default_context_budget_chars")]
    pub context_budget_chars: usize,
    /// Turns kept per room before the oldest are dropped.
    #[serde(default = "default_window_turns")]
    pub window_turns: usize,
}

/// Bounded-retry settings shared by the API clients.
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_setlist_timeout_secs() -> u64 {
    10
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt() -> String {
    "You are a knowledgeable assistant focused on the band Phish. \
     Provide accurate and helpful information about the band, their music, \
     and their performances."
        .to_string()
}

fn default_completion_timeout_secs() -> u64 {
    30
}

fn default_context_budget_chars() -> usize {
    6000
}

fn default_window_turns() -> usize {
    12
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

/// Resolve a secret that may be inline or behind an env var indirection.
/// Absence is a startup error; the process must not start partially configured.
pub fn resolve_secret(
    inline: &Option<String>,
    env_name: &Option<String>,
    what: &str,
) -> Result<String> {
    if let Some(key) = inline {
        return Ok(key.clone());
    }
    if let Some(var) = env_name {
        return std::env::var(var).with_context(|| format!("{what}: env var {var} not set"));
    }
    anyhow::bail!("{what}: set api_key or api_key_env")
}
