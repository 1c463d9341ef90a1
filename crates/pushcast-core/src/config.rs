//! Connection configuration: target environment, credentials, and limits.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{PushError, Result};

/// Local APNs test server.
pub const TEST_HOST: &str = "https://localhost:2197";
/// APNs development (sandbox) server.
pub const DEVELOPMENT_HOST: &str = "https://api.development.push.apple.com:2197";
/// APNs production server.
pub const PRODUCTION_HOST: &str = "https://api.push.apple.com:2197";

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// APNs environment a connection targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local test server.
    Test,
    /// Apple development server.
    #[default]
    #[serde(alias = "sandbox")]
    Development,
    /// Apple production server.
    Production,
}

impl Environment {
    /// Base URL for this environment.
    pub fn host(self) -> &'static str {
        match self {
            Self::Test => TEST_HOST,
            Self::Development => DEVELOPMENT_HOST,
            Self::Production => PRODUCTION_HOST,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Test => "test",
            Self::Development => "development",
            Self::Production => "production",
        })
    }
}

impl FromStr for Environment {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "development" | "sandbox" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(PushError::Config(format!("unknown environment: {other}"))),
        }
    }
}

/// Everything needed to build a [`PushServer`](crate::connection::PushServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Target environment, used when `host` is not set.
    #[serde(default)]
    pub environment: Environment,
    /// Explicit base URL overriding the environment host.
    #[serde(default)]
    pub host: Option<String>,
    /// PEM client certificate.
    pub cert_path: PathBuf,
    /// PEM private key for the client certificate.
    pub key_path: PathBuf,
    /// PEM CA bundle replacing the built-in trust roots.
    #[serde(default)]
    pub ca_path: Option<PathBuf>,
    /// Per-request deadline in seconds. `0` disables it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Cap on concurrently in-flight requests per dispatch.
    #[serde(default)]
    pub max_in_flight: Option<usize>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ConnectionConfig {
    /// Config for an environment with a client certificate and key.
    pub fn new(
        environment: Environment,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            environment,
            host: None,
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            ca_path: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_in_flight: None,
        }
    }

    /// Override the environment host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Trust only the CA bundle at `ca_path`.
    #[must_use]
    pub fn with_ca(mut self, ca_path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(ca_path.into());
        self
    }

    /// Set the per-request deadline.
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Cap concurrently in-flight requests.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    /// Base URL requests are sent to, without a trailing slash.
    pub fn resolved_host(&self) -> &str {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.environment.host())
            .trim_end_matches('/')
    }

    /// Per-request deadline, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Reject configs that cannot produce a working client.
    pub fn validate(&self) -> Result<()> {
        if self.cert_path.as_os_str().is_empty() {
            return Err(PushError::Config("certPath is required".to_string()));
        }
        if self.key_path.as_os_str().is_empty() {
            return Err(PushError::Config("keyPath is required".to_string()));
        }
        if self.max_in_flight == Some(0) {
            return Err(PushError::Config(
                "maxInFlight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a connection config from a JSON file.
pub fn load_config_from_path(path: &Path) -> Result<ConnectionConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PushError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let config: ConnectionConfig = serde_json::from_str(&content).map_err(|e| {
        PushError::Config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;

    debug!(
        ?path,
        environment = %config.environment,
        host = config.resolved_host(),
        "push config loaded"
    );
    Ok(config)
}
