//! Error types for record reconciliation and store access.

use thiserror::Error;

/// Errors surfaced by the connector, the store clients and the reconciler.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Transport, authentication or TLS setup failed, or no endpoint answered.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The addressed key or directory does not exist in the store.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A child payload did not match the record shape.
    #[error("Malformed record payload at {key}: {message}")]
    Deserialization { key: String, message: String },

    /// A single get/set/delete request failed.
    #[error("Store request failed: {0}")]
    StoreRequest(String),

    /// A directory delete was refused because entries remain beneath it.
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// The record path is occupied by data of the wrong kind.
    #[error("Conflict at {path}: {reason}")]
    Conflict { path: String, reason: String },

    /// Some per-entry writes or deletes failed after all entries were attempted.
    #[error("{} of the entries under {path} failed: {}", failures.len(), failures.join("; "))]
    PartialFailure { path: String, failures: Vec<String> },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecordError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::NotFound(_))
    }
}

impl From<config::ConfigError> for RecordError {
    fn from(err: config::ConfigError) -> Self {
        RecordError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        RecordError::StoreRequest(format!("Failed to decode store response: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_message_lists_every_entry() {
        let err = RecordError::PartialFailure {
            path: "/skydns/com/example/www".to_string(),
            failures: vec!["record-a: boom".to_string(), "record-b: bang".to_string()],
        };
        let message = err.to_string();
        assert!(message.starts_with("2 of the entries under /skydns/com/example/www failed"));
        assert!(message.contains("record-a: boom"));
        assert!(message.contains("record-b: bang"));
    }

    #[test]
    fn only_not_found_reports_not_found() {
        assert!(RecordError::NotFound("/x".to_string()).is_not_found());
        assert!(!RecordError::Connection("refused".to_string()).is_not_found());
    }
}
