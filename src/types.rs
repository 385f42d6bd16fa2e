//! Core types shared by the reconciler, the resource surface and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A DNS name mapped to a set of target hosts with a shared time-to-live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRecord {
    /// Fully qualified domain name, dot-separated.
    pub name: String,
    /// Seconds; `None` when unset or read back as non-positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Target addresses or hostnames. Empty means the record should not exist.
    #[serde(default)]
    pub hosts: BTreeSet<String>,
}

impl LogicalRecord {
    pub fn new<I, S>(name: impl Into<String>, ttl: u32, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            ttl: Some(ttl),
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Value stored at each record entry; the shape SkyDNS reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub host: String,
    #[serde(default, skip_serializing_if = "non_positive")]
    pub ttl: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
}

fn non_positive(ttl: &i64) -> bool {
    *ttl <= 0
}

impl RecordPayload {
    pub fn new(host: &str, ttl: Option<u32>, group: &str) -> Self {
        Self {
            host: host.to_string(),
            ttl: ttl.map(i64::from).unwrap_or(0),
            group: group.to_string(),
        }
    }

    /// Positive ttl as seconds, `None` otherwise.
    pub fn ttl_secs(&self) -> Option<u32> {
        if self.ttl > 0 {
            u32::try_from(self.ttl).ok()
        } else {
            None
        }
    }
}
