//! Store connector: builds a ready-to-use etcd handle.
//!
//! No store I/O happens here. Unreachable endpoints surface on the first
//! request; malformed endpoints or TLS material fail immediately.

use super::etcd::{BasicAuth, EtcdKeysClient};
use crate::error::RecordError;
use reqwest::{Certificate, Client, Identity, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Dial timeout applied to the transport when none is configured.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Username/password pair sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// PEM files for a mutually authenticated TLS transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub ca_file: PathBuf,
    pub cert_file: PathBuf,
    /// RSA (PKCS#1), EC (SEC1) or PKCS#8 private key.
    pub key_file: PathBuf,
}

/// Resolved connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoints: Vec<String>,
    pub credentials: Option<Credentials>,
    pub tls: Option<TlsMaterial>,
    pub dial_timeout: Duration,
    pub request_timeout: Option<Duration>,
}

impl StoreConfig {
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            credentials: None,
            tls: None,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            request_timeout: None,
        }
    }
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, RecordError> {
    std::fs::read(path).map_err(|e| {
        RecordError::Connection(format!(
            "Failed to read TLS {} {}: {}",
            what,
            path.display(),
            e
        ))
    })
}

fn contains_certificate(pem: &[u8]) -> bool {
    const MARKER: &[u8] = b"-----BEGIN CERTIFICATE-----";
    pem.windows(MARKER.len()).any(|w| w == MARKER)
}

fn parse_endpoint(endpoint: &str) -> Result<Url, RecordError> {
    let url = Url::parse(endpoint.trim()).map_err(|e| {
        RecordError::Connection(format!("Malformed endpoint {}: {}", endpoint, e))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RecordError::Connection(format!(
            "Unsupported endpoint scheme {} in {}",
            other, endpoint
        ))),
    }
}

/// Build an etcd handle from resolved settings.
pub fn connect(config: &StoreConfig) -> Result<EtcdKeysClient, RecordError> {
    if config.endpoints.is_empty() {
        return Err(RecordError::Connection(
            "At least one endpoint is required".to_string(),
        ));
    }
    let endpoints = config
        .endpoints
        .iter()
        .map(|e| parse_endpoint(e))
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = Client::builder().connect_timeout(config.dial_timeout);
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(tls) = &config.tls {
        let ca = read_pem(&tls.ca_file, "CA bundle")?;
        let cert = read_pem(&tls.cert_file, "certificate")?;
        let key = read_pem(&tls.key_file, "key")?;

        if !contains_certificate(&ca) {
            return Err(RecordError::Connection(format!(
                "Invalid CA bundle {}: no PEM certificate found",
                tls.ca_file.display()
            )));
        }
        let ca = Certificate::from_pem(&ca).map_err(|e| {
            RecordError::Connection(format!(
                "Invalid CA bundle {}: {}",
                tls.ca_file.display(),
                e
            ))
        })?;

        // Certificate chain followed by the key; PKCS#1, SEC1 and PKCS#8 keys are accepted.
        let mut pem = cert;
        pem.push(b'\n');
        pem.extend_from_slice(&key);
        let identity = Identity::from_pem(&pem).map_err(|e| {
            RecordError::Connection(format!(
                "Invalid client certificate/key pair {} / {}: {}",
                tls.cert_file.display(),
                tls.key_file.display(),
                e
            ))
        })?;
        builder = builder.add_root_certificate(ca).identity(identity);
    }

    let http = builder
        .build()
        .map_err(|e| RecordError::Connection(format!("Failed to build transport: {}", e)))?;

    let auth = config.credentials.as_ref().map(|c| BasicAuth {
        username: c.username.clone(),
        password: c.password.clone(),
    });

    debug!(
        endpoints = endpoints.len(),
        tls = config.tls.is_some(),
        authenticated = auth.is_some(),
        "etcd handle ready"
    );
    Ok(EtcdKeysClient::new(http, endpoints, auth))
}
