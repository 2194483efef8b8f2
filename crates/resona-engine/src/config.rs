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

//! Engine settings, loadable from RON.

use anyhow::{Context, Result};
use resona_core::audio::backend::ListenerAttributes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings applied when the engine is initialised.
///
/// ```
/// use resona_engine::EngineConfig;
///
/// let config = EngineConfig::from_ron_str("(max_channels: 64)").unwrap();
/// assert_eq!(config.max_channels, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The number of simultaneous voices the backend should allow.
    pub max_channels: u32,
    /// The listener attributes applied at start-up.
    pub listener: ListenerAttributes,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_channels: 512,
            listener: ListenerAttributes::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse audio engine configuration")
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read audio configuration '{}'", path.display()))?;
        Self::from_ron_str(&text)
    }

    /// Serializes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize audio engine configuration")
    }
}
