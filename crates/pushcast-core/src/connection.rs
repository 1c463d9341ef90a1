//! Connection context: one mutually-authenticated HTTP/2 client per APNs host.
//!
//! A [`PushServer`] is built once per target environment and reused for
//! every dispatch so requests multiplex over the established connection.
//! Server certificate verification is always on; there is no switch to
//! relax it.

use std::path::Path;

use reqwest::{Certificate, Identity};
use tracing::info;

use crate::config::ConnectionConfig;
use crate::errors::{PushError, Result};

/// PEM credentials for the client identity and optional trust roots.
#[derive(Clone)]
pub struct TlsMaterial {
    /// Client certificate chain.
    pub cert_pem: Vec<u8>,
    /// Private key for the client certificate.
    pub key_pem: Vec<u8>,
    /// CA bundle used instead of the built-in roots.
    pub ca_pem: Option<Vec<u8>>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert_pem_len", &self.cert_pem.len())
            .field("has_ca", &self.ca_pem.is_some())
            .finish_non_exhaustive()
    }
}

impl TlsMaterial {
    /// Read the certificate, key, and optional CA bundle named by `config`.
    pub fn load(config: &ConnectionConfig) -> Result<Self> {
        let cert_pem = read_credential("certificate", &config.cert_path)?;
        let key_pem = read_credential("private key", &config.key_path)?;
        let ca_pem = config
            .ca_path
            .as_deref()
            .map(|path| read_credential("CA bundle", path))
            .transpose()?;
        Ok(Self {
            cert_pem,
            key_pem,
            ca_pem,
        })
    }

    fn identity(&self) -> Result<Identity> {
        let mut pem = Vec::with_capacity(self.cert_pem.len() + self.key_pem.len() + 1);
        pem.extend_from_slice(&self.cert_pem);
        pem.push(b'\n');
        pem.extend_from_slice(&self.key_pem);
        Identity::from_pem(&pem).map_err(|e| PushError::Identity {
            reason: e.to_string(),
        })
    }

    fn trust_roots(&self) -> Result<Option<Vec<Certificate>>> {
        let Some(ca_pem) = &self.ca_pem else {
            return Ok(None);
        };
        let roots = Certificate::from_pem_bundle(ca_pem).map_err(|e| PushError::TrustRoot {
            reason: e.to_string(),
        })?;
        if roots.is_empty() {
            return Err(PushError::TrustRoot {
                reason: "no certificates found in CA bundle".to_string(),
            });
        }
        Ok(Some(roots))
    }
}

fn read_credential(what: &'static str, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| PushError::CredentialRead {
        what,
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// A reusable, authenticated client bound to one APNs host.
#[derive(Clone)]
pub struct PushServer {
    host: String,
    client: reqwest::Client,
    max_in_flight: Option<usize>,
}

impl std::fmt::Debug for PushServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushServer")
            .field("host", &self.host)
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}

impl PushServer {
    /// Load credentials from disk and build the client described by `config`.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let material = TlsMaterial::load(config)?;
        Self::from_material(config, &material)
    }

    /// Build the client from already-loaded credentials.
    ///
    /// Host, deadline, and fan-out limit come from `config`; its file paths
    /// are ignored.
    pub fn from_material(config: &ConnectionConfig, material: &TlsMaterial) -> Result<Self> {
        let identity = material.identity()?;

        // APNs only speaks HTTP/2; don't fall back to HTTP/1.1.
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .http2_prior_knowledge()
            .identity(identity);

        if let Some(roots) = material.trust_roots()? {
            builder = builder.tls_built_in_root_certs(false);
            for root in roots {
                builder = builder.add_root_certificate(root);
            }
        }
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| PushError::ClientBuild {
            reason: e.to_string(),
        })?;

        info!(
            host = config.resolved_host(),
            environment = %config.environment,
            custom_ca = material.ca_pem.is_some(),
            timeout_secs = config.request_timeout_secs,
            max_in_flight = ?config.max_in_flight,
            "push connection initialized"
        );

        Ok(Self {
            host: config.resolved_host().to_string(),
            client,
            max_in_flight: config.max_in_flight,
        })
    }

    /// Wrap a caller-built client.
    pub fn with_client(host: impl Into<String>, client: reqwest::Client) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            host,
            client,
            max_in_flight: None,
        }
    }

    /// Cap concurrently in-flight requests per dispatch. `0` is treated as `1`.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }

    /// Base URL requests are sent to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Fan-out limit, if any.
    pub fn max_in_flight(&self) -> Option<usize> {
        self.max_in_flight
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn device_url(&self, device_token: &str) -> String {
        format!("{}/3/device/{}", self.host, device_token)
    }
}
