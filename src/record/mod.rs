//! DNS record layout and reconciliation.

pub mod path;
pub mod reconciler;

pub use path::{
    canonical_name, derive_path, entry_name, normalize_prefix, sanitize_host, sanitized_collisions,
    validate_name, StorePath, DEFAULT_PREFIX, RECORD_ENTRY_MARKER,
};
pub use reconciler::RecordReconciler;
