// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration of a graphics context.

use super::enums::RasterizePath;
use crate::renderer::error::RenderError;
use serde::{Deserialize, Serialize};

/// Default batch size in 32-bit words (32 KiB).
pub const DEFAULT_BATCH_WORDS: usize = 8192;

/// The smallest batch that can hold the full hardware state plus a primitive.
pub const MIN_BATCH_WORDS: usize = 1024;

/// Environment variable forcing the direct-render path when truthy.
pub const ENV_NO_VBUF: &str = "STRATA_NO_VBUF";

/// Environment variable overriding the batch size in words.
pub const ENV_BATCH_WORDS: &str = "STRATA_BATCH_WORDS";

/// Settings applied when a context is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// A label used in logs and batch descriptors.
    pub label: String,
    /// The requested rasterize stage. The device may force the alternate one.
    pub rasterize_path: RasterizePath,
    /// The batch size in 32-bit words.
    pub batch_capacity_words: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            label: "strata context".to_string(),
            rasterize_path: RasterizePath::VertexBuffer,
            batch_capacity_words: DEFAULT_BATCH_WORDS,
        }
    }
}

impl ContextConfig {
    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RenderError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the `STRATA_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_NO_VBUF) {
            match parse_bool_option(&value) {
                Some(true) => self.rasterize_path = RasterizePath::DirectRender,
                Some(false) => self.rasterize_path = RasterizePath::VertexBuffer,
                None => log::warn!("Ignoring {ENV_NO_VBUF}={value:?}: not a boolean"),
            }
        }

        if let Some(value) = lookup(ENV_BATCH_WORDS) {
            match value.trim().parse::<usize>() {
                Ok(words) => self.batch_capacity_words = words,
                Err(e) => log::warn!("Ignoring {ENV_BATCH_WORDS}={value:?}: {e}"),
            }
        }

        self
    }

    /// Checks the configuration can back a working context.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.batch_capacity_words < MIN_BATCH_WORDS {
            return Err(RenderError::InvalidConfig(format!(
                "batch_capacity_words must be at least {MIN_BATCH_WORDS}, got {}",
                self.batch_capacity_words
            )));
        }
        Ok(())
    }
}

fn parse_bool_option(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = ContextConfig::default();
        assert_eq!(config.rasterize_path, RasterizePath::VertexBuffer);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let config = ContextConfig::from_json_str(r#"{ "rasterize_path": "direct_render" }"#)
            .expect("valid json");
        assert_eq!(config.rasterize_path, RasterizePath::DirectRender);
        assert_eq!(config.batch_capacity_words, DEFAULT_BATCH_WORDS);
    }

    #[test]
    fn json_rejects_tiny_batches() {
        let err = ContextConfig::from_json_str(r#"{ "batch_capacity_words": 16 }"#).unwrap_err();
        assert!(matches!(err, RenderError::InvalidConfig(_)));
    }

    #[test]
    fn json_rejects_unknown_paths() {
        let err = ContextConfig::from_json_str(r#"{ "rasterize_path": "raytrace" }"#).unwrap_err();
        assert!(matches!(err, RenderError::InvalidConfig(_)));
    }

    #[test]
    fn no_vbuf_override_selects_direct_render() {
        let config = ContextConfig::default().with_overrides(lookup(&[(ENV_NO_VBUF, "true")]));
        assert_eq!(config.rasterize_path, RasterizePath::DirectRender);

        let config = ContextConfig::default().with_overrides(lookup(&[(ENV_NO_VBUF, "0")]));
        assert_eq!(config.rasterize_path, RasterizePath::VertexBuffer);
    }

    #[test]
    fn garbage_overrides_are_ignored() {
        let config = ContextConfig::default().with_overrides(lookup(&[
            (ENV_NO_VBUF, "maybe"),
            (ENV_BATCH_WORDS, "lots"),
        ]));
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn batch_words_override_is_applied() {
        let config =
            ContextConfig::default().with_overrides(lookup(&[(ENV_BATCH_WORDS, " 2048 ")]));
        assert_eq!(config.batch_capacity_words, 2048);
    }
}
