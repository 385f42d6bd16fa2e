//! etcd v2 keys API client.
//!
//! `GET/PUT/DELETE {endpoint}/v2/keys{key}`. Endpoints are tried in order and
//! a request only moves on to the next endpoint when the connection itself
//! failed.

use super::{canonical_key, DeleteOptions, KeyNode, KeyValueStore};
use crate::error::RecordError;
use async_trait::async_trait;
use reqwest::{Client, Method, Request, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

const KEYS_PATH: &str = "/v2/keys";

const ERROR_KEY_NOT_FOUND: u64 = 100;
const ERROR_NOT_FILE: u64 = 102;
const ERROR_NOT_DIR: u64 = 104;
const ERROR_DIR_NOT_EMPTY: u64 = 108;
const ERROR_UNAUTHORIZED: u64 = 110;

/// Body of a successful keys API response.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysResponse {
    pub action: String,
    #[serde(default)]
    pub node: Option<KeyNode>,
}

#[derive(Debug, Deserialize)]
struct EtcdErrorBody {
    #[serde(rename = "errorCode")]
    error_code: u64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

#[derive(Clone)]
pub(crate) struct BasicAuth {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reusable handle to an etcd cluster. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EtcdKeysClient {
    http: Client,
    endpoints: Vec<Url>,
    auth: Option<BasicAuth>,
}

impl EtcdKeysClient {
    pub(crate) fn new(http: Client, endpoints: Vec<Url>, auth: Option<BasicAuth>) -> Self {
        Self {
            http,
            endpoints,
            auth,
        }
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// Endpoint URL for `key`, each key segment percent-encoded.
    fn keys_url(endpoint: &Url, key: &str) -> Result<Url, RecordError> {
        let mut url = endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                RecordError::StoreRequest(format!("Endpoint {} cannot carry a key path", endpoint))
            })?;
            segments
                .pop_if_empty()
                .extend(KEYS_PATH.split('/').filter(|s| !s.is_empty()))
                .extend(canonical_key(key).split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn build_request(
        &self,
        method: Method,
        endpoint: &Url,
        key: &str,
        query: &[(&str, &str)],
        form: Option<&[(&str, &str)]>,
    ) -> Result<Request, RecordError> {
        let url = Self::keys_url(endpoint, key)?;
        let mut request = self.http.request(method, url).query(query);
        if let Some(form) = form {
            request = request.form(form);
        }
        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        request
            .build()
            .map_err(|e| RecordError::StoreRequest(format!("Invalid request for {}: {}", key, e)))
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        query: &[(&str, &str)],
        form: Option<&[(&str, &str)]>,
    ) -> Result<KeysResponse, RecordError> {
        let mut last_error = String::from("no endpoints configured");

        for endpoint in &self.endpoints {
            let request = self.build_request(method.clone(), endpoint, key, query, form)?;
            debug!(method = %method, url = %request.url(), "etcd request");

            match self.http.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.map_err(|e| {
                        RecordError::StoreRequest(format!(
                            "Failed to read response from {}: {}",
                            endpoint, e
                        ))
                    })?;
                    return decode_body(status, &body, key);
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(endpoint = %endpoint, error = %e, "etcd endpoint unreachable");
                    last_error = e.to_string();
                }
                Err(e) => return Err(RecordError::StoreRequest(e.to_string())),
            }
        }

        Err(RecordError::Connection(format!(
            "No etcd endpoint reachable: {}",
            last_error
        )))
    }
}

/// Map a keys API response body to a result.
pub fn decode_body(status: StatusCode, body: &str, key: &str) -> Result<KeysResponse, RecordError> {
    if status.is_success() {
        return Ok(serde_json::from_str(body)?);
    }

    let parsed: EtcdErrorBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RecordError::Connection(
                    format!("etcd rejected credentials ({}): {}", status, body.trim()),
                ),
                StatusCode::NOT_FOUND => RecordError::NotFound(canonical_key(key)),
                _ => RecordError::StoreRequest(format!("{}: {}", status, body.trim())),
            })
        }
    };

    let cause = parsed.cause.unwrap_or_else(|| canonical_key(key));
    Err(match parsed.error_code {
        ERROR_KEY_NOT_FOUND => RecordError::NotFound(cause),
        ERROR_NOT_FILE | ERROR_NOT_DIR => RecordError::Conflict {
            path: cause,
            reason: parsed.message,
        },
        ERROR_DIR_NOT_EMPTY => RecordError::DirectoryNotEmpty(cause),
        ERROR_UNAUTHORIZED => RecordError::Connection(parsed.message),
        code => RecordError::StoreRequest(format!(
            "etcd error {} on {}: {}",
            code, cause, parsed.message
        )),
    })
}

#[async_trait]
impl KeyValueStore for EtcdKeysClient {
    async fn get(&self, key: &str) -> Result<KeyNode, RecordError> {
        let response = self.send(Method::GET, key, &[], None).await?;
        response.node.ok_or_else(|| {
            RecordError::StoreRequest(format!(
                "etcd {} response for {} carried no node",
                response.action, key
            ))
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RecordError> {
        self.send(Method::PUT, key, &[], Some(&[("value", value)][..]))
            .await
            .map(|_| ())
    }

    async fn delete(&self, key: &str, options: DeleteOptions) -> Result<(), RecordError> {
        let mut query = Vec::new();
        if options.dir {
            query.push(("dir", "true"));
        }
        if options.recursive {
            query.push(("recursive", "true"));
        }
        self.send(Method::DELETE, key, &query, None).await.map(|_| ())
    }
}
