//! Cellar configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CELLAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CELLAR_ALLOCATION_MAX_RETRIES` - Retries after a concurrent stock change (default: 3)
//!
//! ## Optional (webhooks - enables low-stock notifications)
//! - `CELLAR_WEBHOOK_URL` - Endpoint receiving signed alert payloads
//! - `CELLAR_WEBHOOK_SECRET` - HMAC signing secret (high entropy)
//! - `CELLAR_WEBHOOK_MAX_ATTEMPTS` - Attempts before a delivery is failed (default: 5)
//! - `CELLAR_WEBHOOK_TIMEOUT_SECS` - Per-request timeout (default: 10)

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::webhooks::DEFAULT_MAX_ATTEMPTS;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const MIN_WEBHOOK_SECRET_LENGTH: usize = 32;
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ALLOCATION_MAX_RETRIES: u32 = 3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Cellar application configuration.
#[derive(Debug, Clone)]
pub struct CellarConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Retries after an optimistic concurrency conflict
    pub allocation_max_retries: u32,
    /// Webhook configuration (optional, enables alert notifications)
    pub webhook: Option<WebhookConfig>,
}

/// Alert webhook configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct WebhookConfig {
    /// Endpoint receiving alert payloads
    pub url: Url,
    /// HMAC-SHA256 signing secret
    pub secret: SecretString,
    /// Attempts before a delivery is marked failed
    pub max_attempts: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url.as_str())
            .field("secret", &"[REDACTED]")
            .field("max_attempts", &self.max_attempts)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CellarConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`CellarConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let database_url = env
            .get("CELLAR_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("CELLAR_DATABASE_URL".to_string()))?;
        let allocation_max_retries =
            env.parse_or("CELLAR_ALLOCATION_MAX_RETRIES", DEFAULT_ALLOCATION_MAX_RETRIES)?;
        let webhook = WebhookConfig::from_env(&env)?;

        Ok(Self {
            database_url,
            allocation_max_retries,
            webhook,
        })
    }

    /// Returns a reference to the webhook configuration, if available.
    ///
    /// Returns `None` if the webhook variables are not set, which disables
    /// low-stock notifications.
    #[must_use]
    pub const fn webhook(&self) -> Option<&WebhookConfig> {
        self.webhook.as_ref()
    }
}

impl WebhookConfig {
    /// Both `CELLAR_WEBHOOK_URL` and `CELLAR_WEBHOOK_SECRET` must be set together.
    fn from_env<F>(env: &Env<'_, F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (env.get("CELLAR_WEBHOOK_URL"), env.get("CELLAR_WEBHOOK_SECRET")) {
            (Some(url), Some(secret)) => {
                let url = Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar("CELLAR_WEBHOOK_URL".to_string(), e.to_string())
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidEnvVar(
                        "CELLAR_WEBHOOK_URL".to_string(),
                        format!("unsupported scheme '{}'", url.scheme()),
                    ));
                }
                validate_secret_length(&secret, "CELLAR_WEBHOOK_SECRET")?;
                validate_secret_strength(&secret, "CELLAR_WEBHOOK_SECRET")?;

                let max_attempts = env.parse_or("CELLAR_WEBHOOK_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
                if max_attempts == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "CELLAR_WEBHOOK_MAX_ATTEMPTS".to_string(),
                        "must be at least 1".to_string(),
                    ));
                }
                let timeout_secs =
                    env.parse_or("CELLAR_WEBHOOK_TIMEOUT_SECS", DEFAULT_WEBHOOK_TIMEOUT_SECS)?;

                Ok(Some(Self {
                    url,
                    secret: SecretString::from(secret),
                    max_attempts,
                    timeout: Duration::from_secs(timeout_secs),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "CELLAR_WEBHOOK_*".to_string(),
                "Both CELLAR_WEBHOOK_URL and CELLAR_WEBHOOK_SECRET must be set together"
                    .to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the loaders.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, falling back to a default when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_WEBHOOK_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_WEBHOOK_SECRET_LENGTH,
                secret.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
