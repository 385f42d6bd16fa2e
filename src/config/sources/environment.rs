//! Environment variable source: SKYDNS_RECORDS_* prefix with __ separator

use crate::config::ENV_PREFIX;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};
use std::collections::HashMap;

/// Add environment variable overlay to builder.
///
/// `SKYDNS_RECORDS_ENDPOINTS` takes a comma-separated list; nested keys use
/// `__` (`SKYDNS_RECORDS_LOGGING__LEVEL`). `source` stands in for the process
/// environment when given.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    source: Option<HashMap<String, String>>,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("endpoints")
            .source(source),
    )
}
