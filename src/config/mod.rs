//! Provider configuration
//!
//! Connection settings for the etcd cluster plus the SkyDNS key prefix,
//! merged from defaults, config files and the environment.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::RecordError;
use crate::logging::LoggingConfig;
use crate::record::{normalize_prefix, DEFAULT_PREFIX};
use crate::store::{Credentials, StoreConfig, TlsMaterial};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Prefix for environment overrides, e.g. `SKYDNS_RECORDS_ENDPOINTS`.
pub const ENV_PREFIX: &str = "SKYDNS_RECORDS";

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_dial_timeout_secs() -> u64 {
    30
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// etcd client URLs, tried in order.
    #[serde(default)]
    pub endpoints: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,

    /// Root of the SkyDNS key space (default: /skydns/)
    #[serde(default = "default_prefix")]
    pub skydns_prefix: String,

    #[serde(default = "default_dial_timeout_secs")]
    pub dial_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            username: None,
            password: None,
            ca_file: None,
            cert_file: None,
            key_file: None,
            skydns_prefix: default_prefix(),
            dial_timeout_secs: default_dial_timeout_secs(),
            request_timeout_secs: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn present_path(value: &Option<PathBuf>) -> Option<&PathBuf> {
    value.as_ref().filter(|p| !p.as_os_str().is_empty())
}

impl ProviderConfig {
    /// Prefix with exactly one trailing separator.
    pub fn prefix(&self) -> String {
        normalize_prefix(&self.skydns_prefix)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.endpoints.is_empty() {
            return Err(RecordError::Config(
                "At least one endpoint is required (endpoints)".to_string(),
            ));
        }
        for endpoint in &self.endpoints {
            let url = reqwest::Url::parse(endpoint.trim()).map_err(|e| {
                RecordError::Config(format!("Invalid endpoint URL {}: {}", endpoint, e))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(RecordError::Config(format!(
                    "Endpoint {} must use http:// or https://",
                    endpoint
                )));
            }
        }
        if self.dial_timeout_secs == 0 {
            return Err(RecordError::Config(
                "dial_timeout_secs must be positive".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(RecordError::Config(
                "request_timeout_secs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Credentials, only when both halves are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (present(&self.username), present(&self.password)) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            (None, None) => None,
            _ => {
                warn!("username and password must be set together; connecting unauthenticated");
                None
            }
        }
    }

    /// TLS material, only when CA, certificate and key are all set.
    pub fn tls(&self) -> Option<TlsMaterial> {
        let parts = (
            present_path(&self.ca_file),
            present_path(&self.cert_file),
            present_path(&self.key_file),
        );
        match parts {
            (Some(ca), Some(cert), Some(key)) => Some(TlsMaterial {
                ca_file: ca.clone(),
                cert_file: cert.clone(),
                key_file: key.clone(),
            }),
            (None, None, None) => None,
            _ => {
                warn!("ca_file, cert_file and key_file must be set together; using a plain transport");
                None
            }
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            endpoints: self.endpoints.iter().map(|e| e.trim().to_string()).collect(),
            credentials: self.credentials(),
            tls: self.tls(),
            dial_timeout: Duration::from_secs(self.dial_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
