//! Process configuration.
//!
//! Every option can be given as a command-line flag, but MCP hosts normally
//! pass them as environment variables in the server entry of their config
//! file. A `.env` file in the working directory is loaded before parsing.
//!
//! # Environment Variables
//!
//! - `PRIVATE_KEY` - Wallet private key (hex, optional `0x` prefix). When
//!   unset the server runs in demo mode.
//! - `RESOURCE_SERVER_URL` - Places API base URL (default: `https://places-api.x402hub.xyz`)
//! - `ENDPOINT_PATH` - Search endpoint path (default: `/api/places/text-search`)
//! - `REQUEST_TIMEOUT_SECS` - Outbound request timeout (default: `30`)

use std::fmt;
use std::time::Duration;

use clap::Parser;
use url::Url;

/// Default Places API base URL.
pub const DEFAULT_BASE_URL: &str = "https://places-api.x402hub.xyz";

/// Default search endpoint path.
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/places/text-search";

/// Default outbound request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path of the x402 service description document.
pub const SERVICE_INFO_PATH: &str = "/.well-known/x402";

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Errors raised while validating configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The base URL does not parse.
    #[error("Invalid RESOURCE_SERVER_URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The base URL is not `http` or `https`.
    #[error("Unsupported RESOURCE_SERVER_URL scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    /// The endpoint path contains whitespace.
    #[error("Invalid ENDPOINT_PATH {0:?}")]
    InvalidEndpointPath(String),

    /// A zero timeout would fail every request.
    #[error("REQUEST_TIMEOUT_SECS must be greater than zero")]
    InvalidTimeout,
}

/// Command-line and environment options.
#[derive(Parser, Clone)]
#[command(
    name = "places402-mcp",
    version,
    about = "MCP server for the x402 Places API with automatic micropayments"
)]
pub struct Args {
    /// Wallet private key used to pay for searches (hex, optional 0x prefix).
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Places API base URL.
    #[arg(long, env = "RESOURCE_SERVER_URL", default_value = DEFAULT_BASE_URL)]
    pub resource_server_url: String,

    /// Path of the paid search endpoint.
    #[arg(long, env = "ENDPOINT_PATH", default_value = DEFAULT_ENDPOINT_PATH)]
    pub endpoint_path: String,

    /// Timeout for each outbound request, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("resource_server_url", &self.resource_server_url)
            .field("endpoint_path", &self.endpoint_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Validated, immutable settings shared by every component.
#[derive(Clone)]
pub struct Settings {
    base_url: String,
    endpoint_path: String,
    request_timeout: Duration,
    credential: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("endpoint_path", &self.endpoint_path)
            .field("request_timeout", &self.request_timeout)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Settings {
    /// Creates settings for `base_url` with the default endpoint path and
    /// timeout and no credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential: None,
        })
    }

    /// Builds settings from parsed [`Args`].
    ///
    /// Configuration problems never stop the server. A blank endpoint path
    /// uses the default. An invalid endpoint path or a zero timeout is logged
    /// and replaced by its default. An invalid base URL is logged and kept as
    /// given, so every backend call fails with an error result instead.
    #[must_use]
    pub fn from_args(args: Args) -> Self {
        let base_url = normalize_base_url(&args.resource_server_url).unwrap_or_else(|e| {
            tracing::error!(
                error = %e,
                "Backend requests will fail until RESOURCE_SERVER_URL is fixed"
            );
            args.resource_server_url.trim().trim_end_matches('/').to_owned()
        });
        let endpoint_path = normalize_endpoint_path(&args.endpoint_path).unwrap_or_else(|e| {
            tracing::error!(
                error = %e,
                default = DEFAULT_ENDPOINT_PATH,
                "Using default search endpoint"
            );
            DEFAULT_ENDPOINT_PATH.to_owned()
        });
        let request_timeout = if args.request_timeout_secs == 0 {
            tracing::error!(
                error = %ConfigError::InvalidTimeout,
                default = DEFAULT_TIMEOUT_SECS,
                "Using default request timeout"
            );
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(args.request_timeout_secs)
        };
        Self {
            base_url,
            endpoint_path,
            request_timeout,
            credential: args.private_key,
        }
    }

    /// Replaces the search endpoint path. A missing leading `/` is added and
    /// a blank path selects [`DEFAULT_ENDPOINT_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpointPath`] for a path containing
    /// whitespace.
    pub fn with_endpoint_path(mut self, path: &str) -> Result<Self, ConfigError> {
        self.endpoint_path = normalize_endpoint_path(path)?;
        Ok(self)
    }

    /// Replaces the outbound request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replaces the wallet credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search endpoint path, always starting with `/`.
    #[must_use]
    pub fn endpoint_path(&self) -> &str {
        &self.endpoint_path
    }

    /// Timeout applied to every outbound request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Raw credential, if one was configured.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Full URL of the search endpoint.
    #[must_use]
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint_path)
    }

    /// Full URL of the service description document.
    #[must_use]
    pub fn service_info_url(&self) -> String {
        format!("{}{SERVICE_INFO_PATH}", self.base_url)
    }

    /// Full URL of the health endpoint.
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let trimmed = if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed.trim_end_matches('/')
    };
    let url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_owned(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_owned()),
        other => Err(ConfigError::UnsupportedScheme(other.to_owned())),
    }
}

fn normalize_endpoint_path(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_ENDPOINT_PATH.to_owned());
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidEndpointPath(raw.to_owned()));
    }
    Ok(if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    })
}
