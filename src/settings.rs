// src/settings.rs
//! Startup configuration.
//!
//! All settings are read once, from the process environment (optionally seeded
//! by a `.env` file), into an [`AppConfig`] that `main` hands to each component
//! constructor. Nothing below `main` reads the environment.
//!
//! ## Environment Variables
//! - `API_URL`: Verification endpoint; `{cpf}` is replaced by the normalized CPF
//! - `USER_POOLID`: Directory user pool identifier
//! - `JWT_SECRET`: HS256 signing secret
//! - `DIRECTORY_BACKEND`: (Optional) `cognito` (default) or `memory`
//! - `DIRECTORY_ENDPOINT`: (Optional) Cognito endpoint override, for emulators
//! - `DIRECTORY_TIMEOUT_SECS`: (Optional) Directory call timeout, unbounded if unset
//! - `EMAIL_DOMAIN`: (Optional) Domain of synthesized emails (default: exemplo.com)
//! - `VERIFICATION_TIMEOUT_SECS`: (Optional) Verification timeout (default: 10)
//! - `VERIFICATION_UNREACHABLE_IS_ERROR`: (Optional) Answer 503 instead of 404
//!   when the verification backend cannot be reached (default: false)
//! - `BIND_ADDR`: (Optional) HTTP listen address (default: 127.0.0.1:3000)
//!
//! Region and credentials for the Cognito backend come from the standard AWS
//! sources (`AWS_REGION`, `AWS_ACCESS_KEY_ID`, profiles, instance roles).

use config::{Config, Environment};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Default verification timeout, in seconds.
pub const DEFAULT_VERIFICATION_TIMEOUT_SECS: u64 = 10;

/// Default domain for the email attribute of newly created directory records.
pub const DEFAULT_EMAIL_DOMAIN: &str = "exemplo.com";

/// Default HTTP listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Placeholder substituted in `API_URL`.
pub const CPF_PLACEHOLDER: &str = "{cpf}";

/// Secret values that must never be used to sign tokens.
const REJECTED_SECRETS: &[&str] = &["SECRET"];

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("`JWT_SECRET` is empty or a known default; refusing to sign with it")]
    InsecureSecret,

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// HS256 signing secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Wraps a secret, rejecting empty and well-known default values.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() || REJECTED_SECRETS.contains(&secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}

/// Verification backend settings.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Endpoint URL, possibly containing [`CPF_PLACEHOLDER`]
    pub url: String,
    pub timeout: Duration,
}

/// Which directory implementation backs the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryBackend {
    /// Cognito user pool; `endpoint` overrides the regional service URL
    Cognito { endpoint: Option<String> },
    /// Process-local store, for development
    Memory,
}

/// Directory (user pool) settings.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,
    pub user_pool_id: String,
    pub email_domain: String,
    /// `None` leaves directory calls without a deadline
    pub timeout: Option<Duration>,
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub verification: VerificationConfig,
    pub directory: DirectoryConfig,
    pub signing_secret: SigningSecret,
    pub bind_addr: SocketAddr,
    /// Map an unreachable verification backend to 503 rather than 404
    pub unreachable_is_error: bool,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    /// Returns the first missing or invalid setting.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(Environment::default())
            .build()?;
        Self::from_settings(&settings)
    }

    /// Builds an [`AppConfig`] from already-loaded settings.
    ///
    /// Keys are the lowercase forms of the environment variable names.
    pub fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        let url = required(settings, "api_url", "API_URL")?;
        let sample = url.replace(CPF_PLACEHOLDER, "00000000000");
        reqwest::Url::parse(&sample).map_err(|e| ConfigError::Invalid {
            key: "API_URL",
            reason: e.to_string(),
        })?;

        let verification = VerificationConfig {
            url,
            timeout: Duration::from_secs(
                optional_u64(settings, "verification_timeout_secs", "VERIFICATION_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_VERIFICATION_TIMEOUT_SECS),
            ),
        };
        let unreachable_is_error = optional_bool(
            settings,
            "verification_unreachable_is_error",
            "VERIFICATION_UNREACHABLE_IS_ERROR",
        )?
        .unwrap_or(false);

        let backend = match optional(settings, "directory_backend")
            .as_deref()
            .unwrap_or("cognito")
        {
            "cognito" => {
                let endpoint = optional(settings, "directory_endpoint")
                    .filter(|value| !value.trim().is_empty());
                if let Some(endpoint) = &endpoint {
                    reqwest::Url::parse(endpoint).map_err(|e| ConfigError::Invalid {
                        key: "DIRECTORY_ENDPOINT",
                        reason: e.to_string(),
                    })?;
                }
                DirectoryBackend::Cognito { endpoint }
            }
            "memory" => DirectoryBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "DIRECTORY_BACKEND",
                    reason: format!("unknown backend `{other}`"),
                })
            }
        };

        let directory = DirectoryConfig {
            backend,
            user_pool_id: required(settings, "user_poolid", "USER_POOLID")?,
            email_domain: optional(settings, "email_domain")
                .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string()),
            timeout: optional_u64(settings, "directory_timeout_secs", "DIRECTORY_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        };

        let signing_secret = SigningSecret::new(
            optional(settings, "jwt_secret").ok_or(ConfigError::Missing("JWT_SECRET"))?,
        )?;

        let bind_addr = optional(settings, "bind_addr")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            verification,
            directory,
            signing_secret,
            bind_addr,
            unreachable_is_error,
        })
    }
}

fn optional(settings: &Config, key: &str) -> Option<String> {
    settings.get_string(key).ok()
}

fn required(settings: &Config, key: &str, name: &'static str) -> Result<String, ConfigError> {
    optional(settings, key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional_u64(
    settings: &Config,
    key: &str,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    optional(settings, key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn optional_bool(
    settings: &Config,
    key: &str,
    name: &'static str,
) -> Result<Option<bool>, ConfigError> {
    optional(settings, key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::Invalid {
                key: name,
                reason: format!("expected a boolean, got `{other}`"),
            }),
        })
        .transpose()
}
