//! Record reconciler: makes the store match a desired record, or reads a
//! record back out of the store.
//!
//! Each operation is a short sequence of store requests issued one after the
//! other. No state is kept between calls; the store handle is injected.

use super::path::{derive_path, is_entry_name, sanitized_collisions, validate_name, StorePath};
use crate::error::RecordError;
use crate::store::{DeleteOptions, KeyNode, KeyValueStore};
use crate::types::{LogicalRecord, RecordPayload};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub struct RecordReconciler<S> {
    store: S,
    prefix: String,
}

fn is_record_entry(node: &KeyNode) -> bool {
    !node.dir && is_entry_name(node.name())
}

impl<S: KeyValueStore> RecordReconciler<S> {
    pub fn new(store: S, prefix: &str) -> Self {
        Self {
            store,
            prefix: super::path::normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn path_for(&self, name: &str) -> StorePath {
        derive_path(name, &self.prefix)
    }

    /// Write one entry per host, or remove the record when `hosts` is empty.
    ///
    /// Returns the record id, which is the name itself. Entry writes are
    /// independent: every host is attempted and failures are reported
    /// together, so a `PartialFailure` may leave some hosts written.
    pub async fn create_or_replace(
        &self,
        name: &str,
        ttl: u32,
        hosts: &BTreeSet<String>,
    ) -> Result<String, RecordError> {
        validate_name(name)?;
        let path = self.path_for(name);

        if hosts.is_empty() {
            self.remove_subtree(&path).await?;
            info!(record = name, path = %path, "record removed (no hosts)");
            return Ok(name.to_string());
        }

        if ttl == 0 {
            return Err(RecordError::InvalidRecord(format!(
                "Record {} needs a positive ttl",
                name
            )));
        }

        for (entry, colliding) in sanitized_collisions(hosts) {
            warn!(
                record = name,
                entry = %entry,
                hosts = ?colliding,
                "hosts share one store entry; only the last written survives"
            );
        }

        self.ensure_writable(&path).await?;

        let mut failures = Vec::new();
        for host in hosts {
            let key = path.entry_key(host);
            let value = serde_json::to_string(&RecordPayload::new(host, Some(ttl), name))
                .map_err(|e| RecordError::InvalidRecord(e.to_string()))?;

            match self.store.set(&key, &value).await {
                Ok(()) => debug!(key = %key, "entry written"),
                Err(err @ RecordError::Connection(_)) | Err(err @ RecordError::Conflict { .. }) => {
                    return Err(err)
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "entry write failed");
                    failures.push(format!("{}: {}", key, err));
                }
            }
        }

        if !failures.is_empty() {
            return Err(RecordError::PartialFailure {
                path: path.to_string(),
                failures,
            });
        }

        info!(record = name, path = %path, hosts = hosts.len(), ttl, "record written");
        Ok(name.to_string())
    }

    /// Read the record stored under `name`.
    ///
    /// The ttl comes from the last entry in store order. Entries of one record
    /// are written with a single ttl; divergence means something else wrote
    /// there and is only logged.
    pub async fn read(&self, name: &str) -> Result<LogicalRecord, RecordError> {
        validate_name(name)?;
        let path = self.path_for(name);
        let node = self.store.get(path.as_str()).await?;
        if !node.dir {
            return Err(RecordError::Conflict {
                path: path.to_string(),
                reason: "expected a record directory, found a value".to_string(),
            });
        }

        let mut hosts = BTreeSet::new();
        let mut ttl = None;
        let mut observed = BTreeSet::new();
        for child in node.nodes.iter().filter(|n| is_record_entry(n)) {
            let raw = child.value.as_deref().unwrap_or_default();
            let payload: RecordPayload =
                serde_json::from_str(raw).map_err(|e| RecordError::Deserialization {
                    key: child.key.clone(),
                    message: e.to_string(),
                })?;
            ttl = payload.ttl_secs();
            observed.insert(payload.ttl);
            hosts.insert(payload.host);
        }

        if hosts.is_empty() {
            return Err(RecordError::NotFound(path.to_string()));
        }
        if observed.len() > 1 {
            warn!(
                record = name,
                ttls = ?observed,
                chosen = ?ttl,
                "record entries disagree on ttl"
            );
        }

        debug!(record = name, hosts = hosts.len(), "record read");
        Ok(LogicalRecord {
            name: name.to_string(),
            ttl,
            hosts,
        })
    }

    /// Remove every entry of the record and its directory.
    pub async fn delete(&self, name: &str) -> Result<(), RecordError> {
        validate_name(name)?;
        let path = self.path_for(name);
        self.remove_subtree(&path).await?;
        info!(record = name, path = %path, "record deleted");
        Ok(())
    }

    /// Whether the store holds at least one entry for `name`.
    pub async fn exists(&self, name: &str) -> Result<bool, RecordError> {
        validate_name(name)?;
        let path = self.path_for(name);
        match self.store.get(path.as_str()).await {
            Ok(node) => Ok(node.dir && node.nodes.iter().any(is_record_entry)),
            Err(RecordError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// The record path must be absent or a directory before entries go in.
    async fn ensure_writable(&self, path: &StorePath) -> Result<(), RecordError> {
        match self.store.get(path.as_str()).await {
            Ok(node) if node.dir => Ok(()),
            Ok(_) => Err(RecordError::Conflict {
                path: path.to_string(),
                reason: "path holds a value, not a record directory".to_string(),
            }),
            Err(RecordError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Delete the record entries, then the directory if nothing else lives in it.
    ///
    /// Subdomain directories beneath the path belong to other records and are
    /// left alone, in which case the directory stays too.
    async fn remove_subtree(&self, path: &StorePath) -> Result<(), RecordError> {
        let node = match self.store.get(path.as_str()).await {
            Ok(node) => node,
            Err(RecordError::NotFound(_)) => {
                debug!(path = %path, "nothing to remove");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if !node.dir {
            return Err(RecordError::Conflict {
                path: path.to_string(),
                reason: "path holds a value, not a record directory".to_string(),
            });
        }

        let mut failures = Vec::new();
        for child in node.nodes.iter().filter(|n| is_record_entry(n)) {
            match self.store.delete(&child.key, DeleteOptions::leaf()).await {
                Ok(()) | Err(RecordError::NotFound(_)) => debug!(key = %child.key, "entry removed"),
                Err(err @ RecordError::Connection(_)) => return Err(err),
                Err(err) => {
                    warn!(key = %child.key, error = %err, "entry delete failed");
                    failures.push(format!("{}: {}", child.key, err));
                }
            }
        }

        match self.store.delete(path.as_str(), DeleteOptions::empty_dir()).await {
            Ok(()) | Err(RecordError::NotFound(_)) => {}
            Err(RecordError::DirectoryNotEmpty(_)) => {
                debug!(path = %path, "directory kept, other entries remain beneath it")
            }
            Err(err @ RecordError::Connection(_)) => return Err(err),
            Err(err) => failures.push(format!("{}: {}", path, err)),
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RecordError::PartialFailure {
                path: path.to_string(),
                failures,
            })
        }
    }
}
