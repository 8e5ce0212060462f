//! Search configuration.
//!
//! Values are layered: built-in defaults, then an optional configuration file
//! (any format the `config` crate recognises by extension), then environment
//! variables prefixed with `GROUNDSEARCH_`, e.g. `GROUNDSEARCH_BEAM_WIDTH=8`.

use std::time::Duration;

use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use ::config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::error::{GroundingError, Result};
use crate::interface::SearchOptions;

pub const ENV_PREFIX: &str = "GROUNDSEARCH";

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub beam_width: usize,
    pub rule_beam_width: usize,
    pub max_oracle_calls: Option<u64>,
    pub time_budget_ms: Option<u64>,
    pub max_group_objects: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            beam_width: 4,
            rule_beam_width: 4,
            max_oracle_calls: None,
            time_budget_ms: None,
            max_group_objects: 16,
        }
    }
}

impl SearchConfig {
    /// Loads defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        Self::build(builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)))
    }

    /// Parses a TOML document, without consulting the environment.
    pub fn from_toml(text: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: SearchConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.beam_width == 0 || self.rule_beam_width == 0 {
            return Err(GroundingError::Config(
                "beam widths must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            beam_width: self.beam_width,
            rule_beam_width: self.rule_beam_width,
            max_oracle_calls: self.max_oracle_calls,
            time_budget: self.time_budget_ms.map(Duration::from_millis),
            max_group_objects: self.max_group_objects,
            ..SearchOptions::default()
        }
    }
}
