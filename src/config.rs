//! Process configuration, resolved once at startup from the environment.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use log::debug;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

use crate::http::RetryPolicy;
use crate::runtime::Runtime;

pub const USERNAME_VAR: &str = "LAST9_USERNAME";
pub const PASSWORD_VAR: &str = "LAST9_PASSWORD";
pub const TAGS_VAR: &str = "LAST9_TAGS";
pub const ENDPOINT_VAR: &str = "LAST9_ENDPOINT";
pub const MAX_RETRIES_VAR: &str = "MAX_RETRIES";
pub const RETRY_INTERVAL_VAR: &str = "RETRY_INTERVAL";

/// Ingestion endpoint used when `LAST9_ENDPOINT` is not set.
pub const DEFAULT_ENDPOINT: &str = "https://otlp.last9.com/jsonlines/v2";

/// Attempt budget used when `MAX_RETRIES` is not set.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff in milliseconds used when `RETRY_INTERVAL` is not set.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Neither username nor password is configured.
    CredentialsMissing,
    /// The endpoint could not be parsed as a URL.
    InvalidEndpoint { value: String, reason: String },
    /// A numeric variable holds something that is not a non-negative integer.
    InvalidNumber { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::CredentialsMissing => write!(
                f,
                "You have to configure {} and {}.",
                USERNAME_VAR, PASSWORD_VAR
            ),
            ConfigError::InvalidEndpoint { value, reason } => {
                write!(f, "Invalid endpoint URL '{}': {}", value, reason)
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{} must be a non-negative integer, got '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Static basic-auth credentials.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// True when at least one of the two fields is set.
    pub fn is_configured(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// Name of the variable left unset in a half-configured pair.
    pub fn missing_half(&self) -> Option<&'static str> {
        match (&self.username, &self.password) {
            (Some(_), None) => Some(PASSWORD_VAR),
            (None, Some(_)) => Some(USERNAME_VAR),
            _ => None,
        }
    }

    /// `Basic base64(username:password)`, an unset half encoded as empty.
    pub fn authorization_header(&self) -> String {
        let pair = format!(
            "{}:{}",
            self.username.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default()
        );
        format!("Basic {}", BASE64_STANDARD.encode(pair.as_bytes()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoint: Url,
    pub retry: RetryPolicy,
}

impl Config {
    /// Resolves the configuration from environment variables.
    ///
    /// Missing credentials are not an error here; they are reported per
    /// invocation by [`Config::ensure_credentials`].
    #[tracing::instrument(skip(runtime))]
    pub fn from_runtime<R: Runtime>(runtime: &R) -> Result<Self, ConfigError> {
        let credentials = Credentials::new(
            non_empty_var(runtime, USERNAME_VAR),
            non_empty_var(runtime, PASSWORD_VAR),
        );
        let endpoint = build_endpoint(
            non_empty_var(runtime, ENDPOINT_VAR).as_deref(),
            non_empty_var(runtime, TAGS_VAR).as_deref(),
        )?;
        let max_attempts = parse_var(runtime, MAX_RETRIES_VAR)?.unwrap_or(DEFAULT_MAX_RETRIES);
        let interval_ms =
            parse_var(runtime, RETRY_INTERVAL_VAR)?.unwrap_or(DEFAULT_RETRY_INTERVAL_MS);

        debug!(
            "Resolved endpoint {}, {} attempts, {}ms interval",
            endpoint, max_attempts, interval_ms
        );

        Ok(Self {
            credentials,
            endpoint,
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(interval_ms)),
        })
    }

    pub fn ensure_credentials(&self) -> Result<(), ConfigError> {
        if self.credentials.is_configured() {
            Ok(())
        } else {
            Err(ConfigError::CredentialsMissing)
        }
    }
}

/// Resolves the target URL.
///
/// An explicit endpoint is used verbatim. Otherwise the default endpoint gets
/// the comma-separated tags appended as its query string.
pub fn build_endpoint(endpoint: Option<&str>, tags: Option<&str>) -> Result<Url, ConfigError> {
    let raw = match (endpoint, tags) {
        (Some(endpoint), _) => endpoint.to_string(),
        (None, Some(tags)) => {
            let query = tags.split(',').collect::<Vec<_>>().join("&");
            format!("{}?{}", DEFAULT_ENDPOINT, query)
        }
        (None, None) => DEFAULT_ENDPOINT.to_string(),
    };
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEndpoint {
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn non_empty_var<R: Runtime>(runtime: &R, key: &str) -> Option<String> {
    runtime.env_var(key).ok().filter(|v| !v.is_empty())
}

fn parse_var<R: Runtime, T: std::str::FromStr>(
    runtime: &R,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match non_empty_var(runtime, key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var: key, value }),
    }
}
