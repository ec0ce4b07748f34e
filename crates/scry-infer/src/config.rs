//! Engine configuration.
//!
//! Loaded from the `inference` section of the host's JSON configuration.
//! Every field is optional; the defaults match the documented behaviour.

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// When collected return types are widened (`int(1)` -> `int`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralWidening {
    /// Keep literal types as inferred.
    Never,
    /// Widen only when more than one distinct return type is merged.
    #[default]
    WhenMerging,
    /// Always widen.
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferConfig {
    #[serde(default)]
    pub literal_widening: LiteralWidening,
    /// Override tag name without the leading `@`.
    #[serde(default = "default_override_tag")]
    pub override_tag: String,
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: u32,
    #[serde(
        default = "default_true",
        deserialize_with = "deserialize_bool_or_string"
    )]
    pub infer_thrown_from_calls: bool,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            literal_widening: LiteralWidening::default(),
            override_tag: default_override_tag(),
            max_call_depth: default_max_call_depth(),
            infer_thrown_from_calls: true,
        }
    }
}

impl InferConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.override_tag = config.override_tag.trim_start_matches('@').to_string();
        Ok(config)
    }

    pub fn with_literal_widening(mut self, policy: LiteralWidening) -> Self {
        self.literal_widening = policy;
        self
    }

    pub fn with_override_tag(mut self, tag: impl Into<String>) -> Self {
        self.override_tag = tag.into().trim_start_matches('@').to_string();
        self
    }

    pub fn with_max_call_depth(mut self, depth: u32) -> Self {
        self.max_call_depth = depth;
        self
    }
}

fn default_override_tag() -> String {
    "scry-return".to_string()
}

const fn default_max_call_depth() -> u32 {
    64
}

const fn default_true() -> bool {
    true
}

/// Accepts `true`/`false` as well as their common string spellings.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod tests;
