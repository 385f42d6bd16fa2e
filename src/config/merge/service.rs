//! MergeService: orchestrates sources, applies merge policy, deserializes to ProviderConfig.

use crate::config::paths::xdg_root;
use crate::config::sources::{environment, file};
use crate::config::ProviderConfig;
use config::ConfigError;
use std::collections::HashMap;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from standard sources.
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit_file: Option<&Path>) -> Result<ProviderConfig, ConfigError> {
        let global = xdg_root::global_config_path().ok();
        Self::load_layers(global.as_deref(), explicit_file, None)
    }

    /// Compose the layers explicitly. `env` replaces the process environment
    /// when given.
    pub fn load_layers(
        global_file: Option<&Path>,
        explicit_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<ProviderConfig, ConfigError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        if let Some(path) = global_file {
            builder = file::add_optional(builder, path);
        }
        if let Some(path) = explicit_file {
            builder = file::add_required(builder, path)?;
        }
        let builder = environment::add_to_builder(builder, env);

        let config = builder.build()?;
        config.try_deserialize()
    }
}
