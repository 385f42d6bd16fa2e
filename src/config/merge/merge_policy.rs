//! Built-in defaults, the lowest-precedence layer.

use crate::record::DEFAULT_PREFIX;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("endpoints", Vec::<String>::new())?
        .set_default("skydns_prefix", DEFAULT_PREFIX)?
        .set_default("dial_timeout_secs", 30)
}
