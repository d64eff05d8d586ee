//! Render/save configuration loaded with figment.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. An optional YAML, TOML or JSON file (format picked by extension)
//! 3. `FERS_`-prefixed environment variables, nested keys split on `__`
//!    (`FERS_MESSAGES__ID_CONFLICT=...`)

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// User-facing strings written into rendered markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Messages {
    /// Notice shown instead of a repeater whose id clashes with an ancestor.
    pub id_conflict: String,
    /// Alert shown when adding past a repeater's max.
    pub max_reached: String,
    /// Alert shown when removing past a repeater's min.
    pub min_reached: String,
    /// Prompt before a repeater row is removed.
    pub confirm_remove: String,
    /// Error for a blank required field without its own `error_text`.
    pub required: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            id_conflict: "Error: Field ID conflict.".to_string(),
            max_reached: "You cannot add more.".to_string(),
            min_reached: "You cannot remove more.".to_string(),
            confirm_remove: "Are you sure to delete this item?".to_string(),
            required: "This field is required.".to_string(),
        }
    }
}

/// Settings shared by every render and save pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Deepest field nesting rendered or saved before giving up.
    pub max_depth: usize,
    /// Reject saved repeaters whose row count leaves `[min, max]`.
    pub enforce_repeater_bounds: bool,
    /// Reject saved sorters that do not partition their universe.
    pub validate_sorter_universe: bool,
    pub messages: Messages,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            enforce_repeater_bounds: true,
            validate_sorter_universe: true,
            messages: Messages::default(),
        }
    }
}

impl RenderConfig {
    /// Prefix for environment overrides.
    pub const ENV_PREFIX: &'static str = "FERS_";

    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: RenderConfig = Self::figment(path).extract()?;
        debug!(
            max_depth = config.max_depth,
            enforce_repeater_bounds = config.enforce_repeater_bounds,
            validate_sorter_universe = config.validate_sorter_universe,
            "render config loaded"
        );
        Ok(config)
    }

    /// The layered figment behind [`RenderConfig::load`].
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(RenderConfig::default()));
        if let Some(path) = path {
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Yaml::file(path)),
            };
        }
        figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }
}
