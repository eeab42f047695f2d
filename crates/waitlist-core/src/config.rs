use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_API_URL: &str = "WAITLIST_API_URL";
pub const ENV_TIMEOUT_MS: &str = "WAITLIST_API_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "WAITLIST_CONNECT_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "WAITLIST_MAX_RETRIES";
pub const ENV_INITIAL_DELAY_MS: &str = "WAITLIST_RETRY_INITIAL_DELAY_MS";
pub const ENV_MAX_DELAY_MS: &str = "WAITLIST_RETRY_MAX_DELAY_MS";
pub const ENV_BACKOFF_MULTIPLIER: &str = "WAITLIST_RETRY_BACKOFF_MULTIPLIER";
pub const ENV_RATE_LIMIT_FALLBACK_SECS: &str = "WAITLIST_RATE_LIMIT_FALLBACK_SECS";

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any single backoff delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor per attempt; must be > 1.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Client configuration: defaults, then `~/.config/waitlist/config.toml` if present,
/// then `WAITLIST_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitlistConfig {
    /// Base URL of the remote API (e.g. `https://api.example.com`). Required to make calls.
    pub base_url: Option<String>,
    /// Whole-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Cooldown applied after a 429 that carried no usable `retry-after`. 0 = none.
    pub rate_limit_fallback_secs: u64,
    pub retry: RetryConfig,
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            rate_limit_fallback_secs: 5,
            retry: RetryConfig::default(),
        }
    }
}

impl WaitlistConfig {
    /// Override fields from environment-style key lookups. Unset keys are left alone.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = Some(url.to_string());
            }
        }
        override_parsed(&lookup, ENV_TIMEOUT_MS, &mut self.timeout_ms)?;
        override_parsed(&lookup, ENV_CONNECT_TIMEOUT_MS, &mut self.connect_timeout_ms)?;
        override_parsed(&lookup, ENV_RATE_LIMIT_FALLBACK_SECS, &mut self.rate_limit_fallback_secs)?;
        override_parsed(&lookup, ENV_MAX_RETRIES, &mut self.retry.max_retries)?;
        override_parsed(&lookup, ENV_INITIAL_DELAY_MS, &mut self.retry.initial_delay_ms)?;
        override_parsed(&lookup, ENV_MAX_DELAY_MS, &mut self.retry.max_delay_ms)?;
        override_parsed(&lookup, ENV_BACKOFF_MULTIPLIER, &mut self.retry.backoff_multiplier)?;
        Ok(())
    }

    /// Check the invariants the retrier and transport rely on.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than 0");
        }
        let r = &self.retry;
        if r.initial_delay_ms == 0 {
            bail!("retry.initial_delay_ms must be greater than 0");
        }
        if r.max_delay_ms < r.initial_delay_ms {
            bail!(
                "retry.max_delay_ms ({}) must be >= retry.initial_delay_ms ({})",
                r.max_delay_ms,
                r.initial_delay_ms
            );
        }
        if !r.backoff_multiplier.is_finite() || r.backoff_multiplier <= 1.0 {
            bail!(
                "retry.backoff_multiplier must be greater than 1 (got {})",
                r.backoff_multiplier
            );
        }
        if let Some(base) = &self.base_url {
            url::Url::parse(base).with_context(|| format!("invalid base_url {:?}", base))?;
        }
        Ok(())
    }

    /// The base URL, or an error telling the user how to set it.
    pub fn require_base_url(&self) -> Result<&str> {
        match self.base_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!("no API base URL configured; set {} or base_url in config.toml", ENV_API_URL),
        }
    }
}

fn override_parsed<T, F>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw))?;
    }
    Ok(())
}

/// Location of the optional config file, if one exists.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("waitlist")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Parse a config file. Missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<WaitlistConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: WaitlistConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration: defaults, config file (never created), then process environment.
pub fn load() -> Result<WaitlistConfig> {
    let mut cfg = match config_path()? {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            load_from_path(&path)?
        }
        None => WaitlistConfig::default(),
    };
    cfg.apply_env_with(|key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok(cfg)
}
