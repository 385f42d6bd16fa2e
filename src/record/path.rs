//! Mapping from record names to store paths.
//!
//! Labels are reversed so the top-level domain becomes the outermost path
//! segment: `www.example.com` under `/skydns/` lives at `/skydns/com/example/www`.

use crate::error::RecordError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const PATH_SEPARATOR: char = '/';

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "/skydns/";

/// Marks record entries apart from subdomain directories under the same path.
pub const RECORD_ENTRY_MARKER: &str = "record-";

/// Directory holding one record's entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath(String);

impl StorePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full key of the entry for `host`.
    pub fn entry_key(&self, host: &str) -> String {
        format!("{}{}{}", self.0, PATH_SEPARATOR, entry_name(host))
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Force exactly one trailing separator.
pub fn normalize_prefix(prefix: &str) -> String {
    format!("{}{}", prefix.trim_end_matches(PATH_SEPARATOR), PATH_SEPARATOR)
}

/// Name without the optional trailing root dot.
///
/// Two names with the same canonical form share one store path.
pub fn canonical_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

pub fn derive_path(name: &str, prefix: &str) -> StorePath {
    let reversed: Vec<&str> = canonical_name(name).split('.').rev().collect();
    StorePath(format!(
        "{}{}",
        normalize_prefix(prefix),
        reversed.join(&PATH_SEPARATOR.to_string())
    ))
}

/// Key-safe form of a host: `.` and `/` become `_`.
pub fn sanitize_host(host: &str) -> String {
    host.chars()
        .map(|c| if c == '.' || c == PATH_SEPARATOR { '_' } else { c })
        .collect()
}

/// Child name for a host, e.g. `record-10_0_0_1`.
pub fn entry_name(host: &str) -> String {
    format!("{}{}", RECORD_ENTRY_MARKER, sanitize_host(host))
}

pub fn is_entry_name(segment: &str) -> bool {
    segment.starts_with(RECORD_ENTRY_MARKER)
}

/// Hosts that map to the same entry name, keyed by that name.
///
/// Sanitization is lossy (`10.0.0.1` and `10_0_0_1` share `record-10_0_0_1`),
/// so colliding hosts overwrite one another in the store.
pub fn sanitized_collisions<'a, I>(hosts: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut by_entry: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for host in hosts {
        by_entry
            .entry(entry_name(host))
            .or_default()
            .insert(host.clone());
    }
    by_entry
        .into_iter()
        .filter(|(_, hosts)| hosts.len() > 1)
        .map(|(entry, hosts)| (entry, hosts.into_iter().collect()))
        .collect()
}

/// Reject names that cannot be laid out as a path.
pub fn validate_name(name: &str) -> Result<(), RecordError> {
    let trimmed = canonical_name(name);
    if trimmed.trim().is_empty() {
        return Err(RecordError::InvalidRecord(
            "Record name cannot be empty".to_string(),
        ));
    }
    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(RecordError::InvalidRecord(format!(
                "Record name {} contains an empty label",
                name
            )));
        }
        if label.contains(PATH_SEPARATOR) {
            return Err(RecordError::InvalidRecord(format!(
                "Record name {} contains a path separator",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn derives_reversed_path() {
        let path = derive_path("www.example.com", "/skydns/");
        assert_eq!(path.as_str(), "/skydns/com/example/www");
    }

    #[test]
    fn prefix_without_trailing_separator_is_normalized() {
        assert_eq!(derive_path("a.b", "/skydns").as_str(), "/skydns/b/a");
        assert_eq!(derive_path("a.b", "/skydns///").as_str(), "/skydns/b/a");
        assert_eq!(derive_path("a.b", "").as_str(), "/b/a");
    }

    #[test]
    fn trailing_root_dot_is_ignored() {
        assert_eq!(
            derive_path("www.example.com.", "/skydns/"),
            derive_path("www.example.com", "/skydns/")
        );
    }

    #[test]
    fn entry_key_uses_marker_and_sanitized_host() {
        let path = derive_path("www.example.com", "/skydns/");
        assert_eq!(
            path.entry_key("10.0.0.1"),
            "/skydns/com/example/www/record-10_0_0_1"
        );
        assert_eq!(entry_name("a/b.c"), "record-a_b_c");
    }

    #[test]
    fn sanitized_collision_is_reported() {
        let hosts: BTreeSet<String> = ["10.0.0.1", "10_0_0_1", "10.0.0.2"]
            .into_iter()
            .map(String::from)
            .collect();
        let collisions = sanitized_collisions(&hosts);
        assert_eq!(collisions.len(), 1);
        assert_eq!(
            collisions.get("record-10_0_0_1").unwrap(),
            &vec!["10.0.0.1".to_string(), "10_0_0_1".to_string()]
        );
    }

    #[test]
    fn distinct_hosts_do_not_collide() {
        let hosts: Vec<String> = vec!["10.0.0.1".into(), "10.0.0.2".into()];
        assert!(sanitized_collisions(&hosts).is_empty());
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("www.example.com").is_ok());
        assert!(validate_name("www.example.com.").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(".").is_err());
        assert!(validate_name("www..example.com").is_err());
        assert!(validate_name("www/evil.example.com").is_err());
    }

    proptest! {
        #[test]
        fn three_labels_reverse(
            a in "[a-z0-9-]{1,12}",
            b in "[a-z0-9-]{1,12}",
            c in "[a-z0-9-]{1,12}",
            prefix in "(/[a-z]{1,8}){0,3}",
        ) {
            let name = format!("{}.{}.{}", a, b, c);
            let path = derive_path(&name, &prefix);
            prop_assert_eq!(path.as_str(), format!("{}/{}/{}/{}", prefix, c, b, a));
        }

        #[test]
        fn prefix_normalization_is_stable(
            base in "(/[a-z]{1,8}){0,3}",
            trailing in 0usize..5,
        ) {
            let supplied = format!("{}{}", base, "/".repeat(trailing));
            let normalized = normalize_prefix(&supplied);
            prop_assert!(normalized.ends_with('/'));
            prop_assert!(!normalized.ends_with("//"));
            prop_assert_eq!(normalize_prefix(&normalized), normalized.clone());
            prop_assert_eq!(normalized, format!("{}/", base));
        }
    }
}
