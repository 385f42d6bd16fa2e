//! In-process key space with the directory semantics of the etcd keys API.
//!
//! Used by tests and dry runs. Faults can be injected per key, or for the
//! whole store, to exercise partial-failure and connectivity paths.

use super::{canonical_key, DeleteOptions, KeyNode, KeyValueStore};
use crate::error::RecordError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Dir,
    Leaf(String),
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    failing_keys: HashSet<String>,
    unavailable: bool,
}

/// Shared in-memory store; clones see the same key space.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

fn parent_keys(key: &str) -> Vec<String> {
    let mut parents = Vec::new();
    let mut current = key;
    while let Some(idx) = current.rfind('/') {
        if idx == 0 {
            break;
        }
        current = &current[..idx];
        parents.push(current.to_string());
    }
    parents.reverse();
    parents
}

fn is_direct_child(parent: &str, candidate: &str) -> bool {
    let prefix = if parent == "/" {
        "/".to_string()
    } else {
        format!("{}/", parent)
    };
    candidate.len() > prefix.len()
        && candidate.starts_with(&prefix)
        && !candidate[prefix.len()..].contains('/')
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request touching `key` fail with a request error.
    pub fn fail_on(&self, key: &str) {
        self.state.write().failing_keys.insert(canonical_key(key));
    }

    /// Simulate losing the connection to every endpoint.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Raw value of a leaf, if present.
    pub fn value(&self, key: &str) -> Option<String> {
        match self.state.read().entries.get(&canonical_key(key)) {
            Some(Entry::Leaf(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Every key currently stored, directories included, in key order.
    pub fn keys(&self) -> Vec<String> {
        self.state.read().entries.keys().cloned().collect()
    }

    fn check_available(state: &State, key: &str) -> Result<(), RecordError> {
        if state.unavailable {
            return Err(RecordError::Connection(
                "memory store marked unavailable".to_string(),
            ));
        }
        if state.failing_keys.contains(key) {
            return Err(RecordError::StoreRequest(format!(
                "injected failure for {}",
                key
            )));
        }
        Ok(())
    }

    fn node_for(entries: &BTreeMap<String, Entry>, key: &str, entry: &Entry) -> KeyNode {
        match entry {
            Entry::Leaf(value) => KeyNode {
                key: key.to_string(),
                value: Some(value.clone()),
                dir: false,
                nodes: Vec::new(),
            },
            Entry::Dir => KeyNode {
                key: key.to_string(),
                value: None,
                dir: true,
                nodes: entries
                    .iter()
                    .filter(|(child, _)| is_direct_child(key, child))
                    .map(|(child, entry)| match entry {
                        Entry::Leaf(value) => KeyNode {
                            key: child.clone(),
                            value: Some(value.clone()),
                            dir: false,
                            nodes: Vec::new(),
                        },
                        Entry::Dir => KeyNode {
                            key: child.clone(),
                            value: None,
                            dir: true,
                            nodes: Vec::new(),
                        },
                    })
                    .collect(),
            },
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<KeyNode, RecordError> {
        let key = canonical_key(key);
        let state = self.state.read();
        Self::check_available(&state, &key)?;

        if key == "/" {
            return Ok(Self::node_for(&state.entries, &key, &Entry::Dir));
        }
        match state.entries.get(&key) {
            Some(entry) => Ok(Self::node_for(&state.entries, &key, entry)),
            None => Err(RecordError::NotFound(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RecordError> {
        let key = canonical_key(key);
        let mut state = self.state.write();
        Self::check_available(&state, &key)?;

        if key == "/" {
            return Err(RecordError::Conflict {
                path: key,
                reason: "Not a file".to_string(),
            });
        }

        let parents = parent_keys(&key);
        for parent in &parents {
            if let Some(Entry::Leaf(_)) = state.entries.get(parent) {
                return Err(RecordError::Conflict {
                    path: parent.clone(),
                    reason: "Not a directory".to_string(),
                });
            }
        }
        if let Some(Entry::Dir) = state.entries.get(&key) {
            return Err(RecordError::Conflict {
                path: key,
                reason: "Not a file".to_string(),
            });
        }

        for parent in parents {
            state.entries.entry(parent).or_insert(Entry::Dir);
        }
        state.entries.insert(key, Entry::Leaf(value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str, options: DeleteOptions) -> Result<(), RecordError> {
        let key = canonical_key(key);
        let mut state = self.state.write();
        Self::check_available(&state, &key)?;

        match state.entries.get(&key) {
            None => Err(RecordError::NotFound(key)),
            Some(Entry::Leaf(_)) => {
                state.entries.remove(&key);
                Ok(())
            }
            Some(Entry::Dir) => {
                if !options.dir && !options.recursive {
                    return Err(RecordError::Conflict {
                        path: key,
                        reason: "Not a file".to_string(),
                    });
                }
                let descendant_prefix = format!("{}/", key);
                let has_children = state
                    .entries
                    .keys()
                    .any(|k| k.starts_with(&descendant_prefix));
                if has_children && !options.recursive {
                    return Err(RecordError::DirectoryNotEmpty(key));
                }
                state
                    .entries
                    .retain(|k, _| k != &key && !k.starts_with(&descendant_prefix));
                Ok(())
            }
        }
    }
}
