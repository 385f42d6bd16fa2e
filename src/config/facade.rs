//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::ProviderConfig;
use crate::error::RecordError;
use std::path::Path;

/// Configuration loader facade.
///
/// Loading does not validate: command-line overrides are folded in first and
/// the result is validated when a store handle is opened.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file, an optional explicit file, and
    /// the environment.
    pub fn load(explicit_file: Option<&Path>) -> Result<ProviderConfig, RecordError> {
        Ok(MergeService::load(explicit_file)?)
    }
}
