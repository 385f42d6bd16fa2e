//! Key/value store access
//!
//! Hierarchical key space with directory and leaf nodes, as exposed by the
//! etcd v2 keys API. The reconciler only depends on the `KeyValueStore`
//! trait; `EtcdKeysClient` talks to a live cluster and `MemoryStore` keeps
//! the same semantics in process.

pub mod connector;
pub mod etcd;
pub mod memory;

use crate::error::RecordError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use connector::{connect, Credentials, StoreConfig, TlsMaterial, DEFAULT_DIAL_TIMEOUT};
pub use etcd::EtcdKeysClient;
pub use memory::MemoryStore;

/// A node returned by a store lookup.
///
/// Directory lookups list their immediate children in `nodes`; child
/// directories are listed without their own children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNode {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub dir: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<KeyNode>,
}

impl KeyNode {
    /// Last path segment of the key.
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or_default()
    }
}

/// Flags for a delete request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Allow deleting an empty directory.
    pub dir: bool,
    /// Delete a directory together with everything beneath it.
    pub recursive: bool,
}

impl DeleteOptions {
    pub fn leaf() -> Self {
        Self::default()
    }

    pub fn empty_dir() -> Self {
        Self {
            dir: true,
            recursive: false,
        }
    }
}

/// Store operations the reconciler needs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a node; directories come back with their immediate children.
    async fn get(&self, key: &str) -> Result<KeyNode, RecordError>;

    /// Write a leaf value, creating intermediate directories.
    async fn set(&self, key: &str, value: &str) -> Result<(), RecordError>;

    /// Remove a leaf, or a directory when the options allow it.
    async fn delete(&self, key: &str, options: DeleteOptions) -> Result<(), RecordError>;
}

/// Canonical absolute form of a key: leading `/`, no empty segments, no trailing `/`.
pub fn canonical_key(key: &str) -> String {
    let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}
